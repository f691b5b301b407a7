//! HTTP request interface (ESP-IDF only).
//!
//! Routes onto the [`RequestMailbox`]; handlers never touch the
//! orchestrator themselves.  The upload route streams straight into the
//! OTA partition and reports its lifecycle through an [`OtaReporter`].
//!
//! | Route                  | Method | Request                     |
//! |------------------------|--------|-----------------------------|
//! | `/api/config`          | GET    | `Request::GetConfig`        |
//! | `/api/config`          | POST   | `Request::SetConfig`        |
//! | `/api/status`          | GET    | `Request::GetStatus`        |
//! | `/api/wifi/disconnect` | POST   | `Request::Disconnect`       |
//! | `/api/wifi/retry`      | POST   | `Request::Retry`            |
//! | `/api/update`          | POST   | firmware upload (token)     |
//! | `/*`                   | GET    | static UI from the web root |
//!
//! Anything else answers 404 `{"error":"Not found"}`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use embedded_svc::http::{Headers, Method};
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use futures_lite::future::block_on;
use log::{info, warn};

use crate::app::commands::{ConfigUpdate, Request as AppRequest, Response};
use crate::app::mailbox::RequestMailbox;
use crate::update_gate::UpdateErrorKind;

use super::ota::{self, OtaReporter};
use super::web_assets;

/// Header carrying the update password on uploads.
pub const UPDATE_TOKEN_HEADER: &str = "X-Update-Token";

/// Largest accepted `POST /api/config` body.
const MAX_CONFIG_BODY: usize = 1024;

/// Read size when streaming a static file.
const FILE_CHUNK: usize = 1024;

/// Delay between answering a successful upload and rebooting.
const RESTART_DELAY: Duration = Duration::from_millis(500);

type HttpRequest<'a, 'r> = Request<&'a mut EspHttpConnection<'r>>;

/// Where the static UI lives and which document under it stays private.
pub struct WebRoot {
    pub dir: PathBuf,
    pub private_document: String,
}

pub fn start(
    port: u16,
    mailbox: Arc<RequestMailbox>,
    reporter: OtaReporter,
    update_password: String,
    web: WebRoot,
) -> Result<EspHttpServer<'static>> {
    let conf = Configuration {
        http_port: port,
        stack_size: 10 * 1024,
        uri_match_wildcard: true,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&conf)?;

    {
        let mailbox = mailbox.clone();
        server.fn_handler::<anyhow::Error, _>("/api/config", Method::Get, move |req| {
            let resp = block_on(mailbox.call(AppRequest::GetConfig));
            respond(req, &resp)
        })?;
    }

    {
        let mailbox = mailbox.clone();
        server.fn_handler::<anyhow::Error, _>("/api/config", Method::Post, move |mut req| {
            let resp = match read_body(&mut req)? {
                None => Response::Invalid("Request body too large"),
                Some(body) => match ConfigUpdate::from_json(&body) {
                    Some(update) => block_on(mailbox.call(AppRequest::SetConfig(update))),
                    None => Response::Invalid("Invalid JSON"),
                },
            };
            respond(req, &resp)
        })?;
    }

    for (uri, request) in [
        ("/api/wifi/disconnect", AppRequest::Disconnect),
        ("/api/wifi/retry", AppRequest::Retry),
    ] {
        let mailbox = mailbox.clone();
        server.fn_handler::<anyhow::Error, _>(uri, Method::Post, move |req| {
            let resp = block_on(mailbox.call(request.clone()));
            respond(req, &resp)
        })?;
    }

    server.fn_handler::<anyhow::Error, _>("/api/status", Method::Get, move |req| {
        let resp = block_on(mailbox.call(AppRequest::GetStatus));
        respond(req, &resp)
    })?;

    server.fn_handler::<anyhow::Error, _>("/api/update", Method::Post, move |mut req| {
        if !ota::authorize(req.header(UPDATE_TOKEN_HEADER), &update_password) {
            warn!("HTTP: firmware upload rejected, bad or missing token");
            reporter.failed(UpdateErrorKind::Auth);
            return write_json(req, 401, &serde_json::json!({ "error": "Unauthorized" }));
        }

        let total = req.content_len().unwrap_or(0) as u32;
        info!("HTTP: firmware upload started ({} bytes)", total);
        let result = ota::receive_firmware(|buf| req.read(buf).ok(), total, &reporter);

        match result {
            Ok(_) => {
                write_json(
                    req,
                    200,
                    &serde_json::json!({ "success": true, "message": "Update complete. Rebooting." }),
                )?;
                schedule_restart();
                Ok(())
            }
            Err(reason) => write_json(
                req,
                500,
                &serde_json::json!({ "success": false, "error": reason.to_string() }),
            ),
        }
    })?;

    // Wildcards are registered last so the routes above match first.
    server.fn_handler::<anyhow::Error, _>("/*", Method::Get, move |req| {
        let asset = web_assets::locate(&web.dir, req.uri(), &web.private_document);
        match asset {
            Some(asset) => serve_file(req, &asset),
            None => not_found(req),
        }
    })?;
    server.fn_handler::<anyhow::Error, _>("/*", Method::Post, not_found)?;

    info!("HTTP: server listening on port {}", port);
    Ok(server)
}

/// Read a bounded request body.  `None` when it exceeds the limit.
fn read_body(req: &mut HttpRequest<'_, '_>) -> Result<Option<Vec<u8>>> {
    let len = req.content_len().unwrap_or(0) as usize;
    if len > MAX_CONFIG_BODY {
        return Ok(None);
    }
    let mut body = vec![0u8; len];
    if len > 0 {
        req.read_exact(&mut body)?;
    }
    Ok(Some(body))
}

fn serve_file(req: HttpRequest<'_, '_>, asset: &web_assets::Asset) -> Result<()> {
    use std::io::Read as _;

    let mut file = match std::fs::File::open(&asset.path) {
        Ok(file) => file,
        Err(e) => {
            warn!("HTTP: cannot open {}: {}", asset.path.display(), e);
            return not_found(req);
        }
    };

    let mut headers = vec![("Content-Type", asset.content_type)];
    if asset.gzipped {
        headers.push(("Content-Encoding", "gzip"));
    }
    let mut resp = req.into_response(200, None, &headers)?;

    let mut buf = [0u8; FILE_CHUNK];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        resp.write_all(&buf[..n])?;
    }
    Ok(())
}

fn not_found(req: HttpRequest<'_, '_>) -> Result<()> {
    write_json(req, 404, &serde_json::json!({ "error": "Not found" }))
}

fn respond(req: HttpRequest<'_, '_>, resp: &Response) -> Result<()> {
    let body = resp.body();
    req.into_response(
        resp.status_code(),
        None,
        &[("Content-Type", "application/json; charset=utf-8")],
    )?
    .write_all(&body)?;
    Ok(())
}

fn write_json(req: HttpRequest<'_, '_>, status: u16, payload: &serde_json::Value) -> Result<()> {
    let body = serde_json::to_vec(payload).unwrap_or_default();
    req.into_response(
        status,
        None,
        &[("Content-Type", "application/json; charset=utf-8")],
    )?
    .write_all(&body)?;
    Ok(())
}

/// Reboot into the new image once the response has been flushed.
fn schedule_restart() {
    let spawned = std::thread::Builder::new()
        .name("ota-restart".into())
        .spawn(|| {
            std::thread::sleep(RESTART_DELAY);
            esp_idf_svc::hal::reset::restart();
        });
    if let Err(e) = spawned {
        warn!("HTTP: restart thread failed ({}), restarting now", e);
        esp_idf_svc::hal::reset::restart();
    }
}

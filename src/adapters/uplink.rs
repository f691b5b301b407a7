//! Telemetry uplink adapter.
//!
//! Implements [`UplinkPort`].  With an endpoint configured the report is
//! POSTed as JSON through the ESP-IDF HTTP client; without one (and on the
//! host) the payload is only logged.

use log::{debug, info};

use crate::app::ports::{UplinkError, UplinkPort};
use crate::status::TelemetryReport;

pub struct HttpUplink {
    endpoint: Option<String>,
    #[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
    timeout_ms: u64,
    sent: u32,
}

impl HttpUplink {
    pub fn new(endpoint: Option<String>, timeout_ms: u64) -> Self {
        match &endpoint {
            Some(url) => info!("Uplink: posting telemetry to {}", url),
            None => info!("Uplink: no endpoint configured, telemetry is logged only"),
        }
        Self {
            endpoint,
            timeout_ms,
            sent: 0,
        }
    }

    /// Reports handed to the transport successfully.
    pub fn sent(&self) -> u32 {
        self.sent
    }

    #[cfg(target_os = "espidf")]
    fn platform_post(&self, url: &str, body: &[u8]) -> Result<(), UplinkError> {
        use core::time::Duration;
        use embedded_svc::http::{Method, Status};
        use embedded_svc::http::client::Client;
        use embedded_svc::io::Write;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use log::warn;

        let conf = Configuration {
            timeout: Some(Duration::from_millis(self.timeout_ms)),
            ..Default::default()
        };
        let conn = EspHttpConnection::new(&conf).map_err(|e| {
            warn!("Uplink: connection setup failed: {:?}", e);
            UplinkError::Transport
        })?;
        let mut client = Client::wrap(conn);

        let len = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", len.as_str()),
        ];
        let mut request = client
            .request(Method::Post, url, &headers)
            .map_err(|_| UplinkError::Transport)?;
        request.write_all(body).map_err(|_| UplinkError::Transport)?;
        request.flush().map_err(|_| UplinkError::Transport)?;
        let response = request.submit().map_err(|_| UplinkError::Transport)?;

        let status = response.status();
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(UplinkError::Status(status))
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_post(&self, url: &str, body: &[u8]) -> Result<(), UplinkError> {
        debug!("Uplink(sim): POST {} ({} bytes)", url, body.len());
        Ok(())
    }
}

impl UplinkPort for HttpUplink {
    fn send(&mut self, report: &TelemetryReport) -> Result<(), UplinkError> {
        let body = report.to_json();
        match self.endpoint.as_deref() {
            Some(url) => self.platform_post(url, &body)?,
            None => debug!("Uplink: {}", String::from_utf8_lossy(&body)),
        }
        self.sent = self.sent.wrapping_add(1);
        Ok(())
    }
}

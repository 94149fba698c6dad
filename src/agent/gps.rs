//! GPS fix sub-probe
//!
//! Gps-capable agents read the latest fix from a local position source
//! over HTTP. The probe is bounded and its failure degrades the `gps`
//! field to unknown instead of failing the status response.

use std::time::Duration;

use crate::nodes::{GpsFix, GpsReport};

const FIX_TIMEOUT: Duration = Duration::from_millis(1500);

/// Fetch the current fix from the local source. Never fails.
pub async fn read_fix(client: &reqwest::Client, url: &str) -> GpsReport {
    let response = match client.get(url).timeout(FIX_TIMEOUT).send().await {
        Ok(resp) => resp,
        Err(e) => {
            let detail = if e.is_timeout() {
                format!("fix source timed out after {}ms", FIX_TIMEOUT.as_millis())
            } else {
                format!("fix source unreachable: {e}")
            };
            return GpsReport {
                ok: false,
                fix: None,
                detail,
            };
        }
    };

    if !response.status().is_success() {
        return GpsReport {
            ok: false,
            fix: None,
            detail: format!("fix source answered http {}", response.status().as_u16()),
        };
    }

    match response.json::<GpsFix>().await {
        Ok(fix) => GpsReport {
            ok: fix.fix_ok.unwrap_or(true),
            fix: Some(fix),
            detail: "fix ok".to_string(),
        },
        Err(e) => GpsReport {
            ok: false,
            fix: None,
            detail: format!("fix payload invalid: {e}"),
        },
    }
}

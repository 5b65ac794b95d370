//! Scoped ownership of one gateway session.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::port::{FetchError, GatewaySession, MarketDataGateway};

/// Owns a session and guarantees it is disconnected.
///
/// The normal path calls [`close`](Self::close). If the guard is dropped
/// without closing (a panic or an abandoned future), the disconnect is
/// handed to the runtime instead.
pub struct SessionGuard {
    session: Option<Box<dyn GatewaySession>>,
    gateway: &'static str,
}

impl SessionGuard {
    /// Connect, bounded by `deadline`.
    ///
    /// # Errors
    ///
    /// [`FetchError::Timeout`] when the gateway does not answer in time,
    /// [`FetchError::Upstream`] when it refuses.
    pub async fn open(gateway: &dyn MarketDataGateway, deadline: Duration) -> Result<Self, FetchError> {
        let name = gateway.name();
        match timeout(deadline, gateway.connect()).await {
            Ok(Ok(session)) => {
                debug!(gateway = name, "Gateway session opened");
                Ok(Self {
                    session: Some(session),
                    gateway: name,
                })
            }
            Ok(Err(err)) => {
                warn!(gateway = name, error = %err, "Gateway connection failed");
                Err(FetchError::Upstream(err.to_string()))
            }
            Err(_) => {
                warn!(gateway = name, timeout_ms = deadline.as_millis() as u64, "Gateway connection timed out");
                Err(FetchError::Timeout(deadline))
            }
        }
    }

    /// Disconnect and consume the guard.
    pub async fn close(mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect().await;
            debug!(gateway = self.gateway, "Gateway session closed");
        }
    }
}

impl Deref for SessionGuard {
    type Target = dyn GatewaySession;

    fn deref(&self) -> &Self::Target {
        self.session
            .as_deref()
            .unwrap_or_else(|| unreachable!("session is only taken by close"))
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session
            .as_deref_mut()
            .unwrap_or_else(|| unreachable!("session is only taken by close"))
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        let gateway = self.gateway;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(gateway, "Gateway session dropped without close, disconnecting");
                handle.spawn(async move {
                    session.disconnect().await;
                });
            }
            Err(_) => warn!(gateway, "Gateway session leaked outside runtime"),
        }
    }
}

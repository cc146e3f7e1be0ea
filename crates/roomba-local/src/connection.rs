//! Connection lifecycle policies
//!
//! One session contract, two lifetimes: [`KeepAlivePolicy`] shares a single
//! long-lived session created lazily on first use, [`EphemeralPolicy`] opens
//! a fresh session per operation and tears it down afterward. The policy is
//! selected once at construction from configuration; call sites never branch
//! on the mode.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::transport::{RobotSession, RobotTransport, TransportError};

/// Produces ready-to-use sessions and guarantees their release
#[async_trait]
pub trait ConnectionPolicy: Send + Sync {
    /// Establish (or reuse) a session
    async fn open(&self) -> Result<Arc<dyn RobotSession>, TransportError>;

    /// Suspend until the session is usable
    async fn await_ready(&self, session: &Arc<dyn RobotSession>) -> Result<(), TransportError>;

    /// Release the session; a no-op when the policy owns it
    async fn close(&self, session: Arc<dyn RobotSession>);

    /// Open and wait for readiness, closing the session if readiness fails.
    ///
    /// Convenience for the common open -> ready prefix; the caller still
    /// owns the close on its own success and error paths.
    async fn acquire(&self) -> Result<Arc<dyn RobotSession>, TransportError> {
        let session = self.open().await?;
        if let Err(err) = self.await_ready(&session).await {
            self.close(session).await;
            return Err(err);
        }
        Ok(session)
    }
}

/// Select the policy implied by the configuration
pub fn policy_from_config(
    transport: Arc<dyn RobotTransport>,
    keep_alive_enabled: bool,
) -> Arc<dyn ConnectionPolicy> {
    if keep_alive_enabled {
        Arc::new(KeepAlivePolicy::new(transport))
    } else {
        Arc::new(EphemeralPolicy::new(transport))
    }
}

/// Fresh session per operation, closed on every exit path
pub struct EphemeralPolicy {
    transport: Arc<dyn RobotTransport>,
}

impl EphemeralPolicy {
    pub fn new(transport: Arc<dyn RobotTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ConnectionPolicy for EphemeralPolicy {
    async fn open(&self) -> Result<Arc<dyn RobotSession>, TransportError> {
        self.transport.open().await
    }

    async fn await_ready(&self, session: &Arc<dyn RobotSession>) -> Result<(), TransportError> {
        session.await_ready().await?;
        debug!("Connected to robot");
        Ok(())
    }

    async fn close(&self, session: Arc<dyn RobotSession>) {
        session.close().await;
    }
}

/// One shared session held for the accessory's entire lifetime
///
/// The session is created lazily on first use and never closed by this
/// policy; reconnection after a drop is the transport's concern.
pub struct KeepAlivePolicy {
    transport: Arc<dyn RobotTransport>,
    session: tokio::sync::Mutex<Option<Arc<dyn RobotSession>>>,
}

impl KeepAlivePolicy {
    pub fn new(transport: Arc<dyn RobotTransport>) -> Self {
        Self {
            transport,
            session: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl ConnectionPolicy for KeepAlivePolicy {
    async fn open(&self) -> Result<Arc<dyn RobotSession>, TransportError> {
        let mut shared = self.session.lock().await;
        if let Some(session) = shared.as_ref() {
            return Ok(session.clone());
        }

        let session = self.transport.open().await?;
        *shared = Some(session.clone());
        debug!("Opened shared robot session");
        Ok(session)
    }

    async fn await_ready(&self, session: &Arc<dyn RobotSession>) -> Result<(), TransportError> {
        // Already connected: do not wait for a new ready signal.
        if session.is_connected() {
            return Ok(());
        }
        session.await_ready().await?;
        debug!("Connected to robot");
        Ok(())
    }

    async fn close(&self, _session: Arc<dyn RobotSession>) {
        // The shared session outlives the call.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockConfig;
    use crate::transport::mock::MockRobot;

    #[tokio::test]
    async fn ephemeral_opens_a_fresh_session_each_time() {
        let robot = MockRobot::new(&MockConfig::default());
        let policy = EphemeralPolicy::new(Arc::new(robot.clone()));

        let first = policy.acquire().await.unwrap();
        policy.close(first).await;
        let second = policy.acquire().await.unwrap();
        policy.close(second).await;

        assert_eq!(robot.open_count(), 2);
        assert_eq!(robot.close_count(), 2);
    }

    #[tokio::test]
    async fn keep_alive_reuses_one_session_and_never_closes() {
        let robot = MockRobot::new(&MockConfig::default());
        let policy = KeepAlivePolicy::new(Arc::new(robot.clone()));

        let first = policy.acquire().await.unwrap();
        policy.close(first).await;
        let second = policy.acquire().await.unwrap();
        policy.close(second).await;

        assert_eq!(robot.open_count(), 1);
        assert_eq!(robot.close_count(), 0);
    }

    #[tokio::test]
    async fn keep_alive_skips_ready_wait_when_connected() {
        let robot = MockRobot::new(&MockConfig::default());
        let policy = KeepAlivePolicy::new(Arc::new(robot.clone()));

        let session = policy.acquire().await.unwrap();
        assert!(session.is_connected());

        // A later ready failure must not matter once connected.
        robot.fail_on(crate::transport::mock::MockOp::Ready, true);
        policy.await_ready(&session).await.unwrap();
    }

    #[tokio::test]
    async fn acquire_closes_ephemeral_session_when_ready_fails() {
        let robot = MockRobot::new(&MockConfig::default());
        robot.fail_on(crate::transport::mock::MockOp::Ready, true);
        let policy = EphemeralPolicy::new(Arc::new(robot.clone()));

        let err = policy.acquire().await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionFailed(_)));
        assert_eq!(robot.open_count(), 1);
        assert_eq!(robot.close_count(), 1);
    }
}

//! Poll orchestration: request validation, strategy resolution and error
//! normalization.

use crate::config::PollConfig;
use crate::error::{Result, TelemetryError};
use crate::polling::strategy::{DeviceSnapshot, StrategyRegistry};
use crate::transport::{Community, SnmpQuery, SnmpTarget};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::info;

/// One poll request as the caller phrased it; unset fields fall back to the
/// configured defaults.
#[derive(Debug, Clone, Default)]
pub struct PollRequest {
    /// Target address, textual; validated before any network activity
    pub ip: String,
    pub port: Option<u16>,
    pub community: Option<String>,
    pub strategy: Option<String>,
}

/// Entry point of the polling side: validates, resolves a strategy and runs
/// it against the target.
pub struct Poller {
    transport: Arc<dyn SnmpQuery>,
    registry: StrategyRegistry,
    defaults: PollConfig,
}

impl Poller {
    pub fn new(
        transport: Arc<dyn SnmpQuery>,
        registry: StrategyRegistry,
        defaults: PollConfig,
    ) -> Self {
        Self {
            transport,
            registry,
            defaults,
        }
    }

    /// Polls one device into a snapshot.
    ///
    /// Caller mistakes (bad address, unknown strategy) surface as
    /// [`TelemetryError::InvalidInput`] without touching the network.
    /// Transport failures keep their [`TelemetryError::DeviceUnreachable`]
    /// identity; any other failure is normalized to
    /// [`TelemetryError::UnexpectedPoll`] with the cause preserved.
    pub async fn poll(&self, request: &PollRequest) -> Result<DeviceSnapshot> {
        let addr: IpAddr = request.ip.trim().parse().map_err(|_| {
            TelemetryError::InvalidInput(format!("'{}' is not a valid IP address", request.ip))
        })?;

        let strategy_name = request
            .strategy
            .as_deref()
            .unwrap_or(&self.defaults.strategy);
        let strategy = self.registry.get(strategy_name).ok_or_else(|| {
            TelemetryError::InvalidInput(format!("unknown poll strategy '{}'", strategy_name))
        })?;

        let target = SnmpTarget::new(
            addr,
            request.port.unwrap_or(self.defaults.port),
            self.defaults.timeout(),
            self.defaults.retries,
        );
        let community = Community(
            request
                .community
                .clone()
                .unwrap_or_else(|| self.defaults.community.clone()),
        );

        info!(
            ip = %addr,
            port = target.port,
            strategy = strategy_name,
            "polling device"
        );

        match strategy
            .run(self.transport.as_ref(), &target, &community)
            .await
        {
            Ok(snapshot) => {
                info!(
                    ip = %addr,
                    interfaces = snapshot.interfaces.len(),
                    "poll completed"
                );
                Ok(snapshot)
            }
            Err(e @ (TelemetryError::DeviceUnreachable(_) | TelemetryError::InvalidInput(_))) => {
                Err(e)
            }
            Err(e) => Err(TelemetryError::UnexpectedPoll(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{QueryMode, RawPair};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct EmptyTransport;

    #[async_trait]
    impl SnmpQuery for EmptyTransport {
        async fn query(
            &self,
            _mode: QueryMode,
            _target: &SnmpTarget,
            _community: &Community,
            _oid: &str,
        ) -> Result<Vec<RawPair>> {
            Ok(Vec::new())
        }
    }

    struct UnreachableTransport;

    #[async_trait]
    impl SnmpQuery for UnreachableTransport {
        async fn query(
            &self,
            _mode: QueryMode,
            target: &SnmpTarget,
            _community: &Community,
            _oid: &str,
        ) -> Result<Vec<RawPair>> {
            Err(TelemetryError::DeviceUnreachable(target.endpoint()))
        }
    }

    fn poller(transport: Arc<dyn SnmpQuery>) -> Poller {
        Poller::new(
            transport,
            StrategyRegistry::with_defaults(),
            PollConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_bad_address_is_invalid_input() {
        let poller = poller(Arc::new(EmptyTransport));
        let err = poller
            .poll(&PollRequest {
                ip: "not-an-ip".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_invalid_input() {
        let poller = poller(Arc::new(EmptyTransport));
        let err = poller
            .poll(&PollRequest {
                ip: "10.0.0.1".to_string(),
                strategy: Some("bespoke".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_keeps_its_identity() {
        let poller = poller(Arc::new(UnreachableTransport));
        let err = poller
            .poll(&PollRequest {
                ip: "10.0.0.1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, TelemetryError::DeviceUnreachable(_)));
    }

    #[tokio::test]
    async fn test_empty_device_yields_empty_snapshot() {
        let poller = poller(Arc::new(EmptyTransport));
        let snapshot = poller
            .poll(&PollRequest {
                ip: "10.0.0.1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(snapshot.ip_address, "10.0.0.1");
        assert!(snapshot.host_name.is_none());
        assert!(snapshot.interfaces.is_empty());
    }

    #[tokio::test]
    async fn test_request_overrides_defaults() {
        struct CaptureTransport(parking_lot::Mutex<Vec<(u16, String)>>);

        #[async_trait]
        impl SnmpQuery for CaptureTransport {
            async fn query(
                &self,
                _mode: QueryMode,
                target: &SnmpTarget,
                community: &Community,
                _oid: &str,
            ) -> Result<Vec<RawPair>> {
                self.0.lock().push((target.port, community.0.clone()));
                Ok(Vec::new())
            }
        }

        let transport = Arc::new(CaptureTransport(parking_lot::Mutex::new(Vec::new())));
        let poller = poller(transport.clone());
        poller
            .poll(&PollRequest {
                ip: "10.0.0.1".to_string(),
                port: Some(10161),
                community: Some("secret".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let seen = transport.0.lock();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|(p, c)| *p == 10161 && c == "secret"));
    }
}

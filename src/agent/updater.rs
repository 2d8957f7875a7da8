//! Periodic registry updaters.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::error;

use crate::error::Result;
use crate::registry::Registry;

use super::Agent;

impl Agent {
    /// Spawn a task that mutates the registry on a fixed period.
    ///
    /// The callback runs under the registry write lock, so in-flight
    /// requests always see either the previous or the new registry
    /// state, never a partial tick. A failed tick is logged and the
    /// schedule continues.
    ///
    /// The task exits when [`Agent::shutdown`] is called; the returned
    /// handle can be awaited to observe that exit.
    pub fn spawn_updater<F>(&self, period: Duration, mut tick: F) -> JoinHandle<()>
    where
        F: FnMut(&mut Registry) -> Result<()> + Send + 'static,
    {
        let agent = self.clone();
        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick of `interval` fires immediately
            timer.tick().await;
            loop {
                tokio::select! {
                    _ = agent.cancel_token().cancelled() => return,
                    _ = timer.tick() => {
                        let mut registry = agent.registry().write().await;
                        if let Err(error) = tick(&mut registry) {
                            error!(%error, "registry updater tick failed");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::provider::Provider;
    use crate::value::Value;

    #[tokio::test(start_paused = true)]
    async fn test_updater_ticks_and_stops() {
        let agent = Agent::builder()
            .bind("127.0.0.1:0".parse().unwrap())
            .build()
            .await
            .unwrap();
        {
            let mut registry = agent.registry().write().await;
            registry
                .insert_scalar(oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1), Provider::constant(0))
                .unwrap();
        }

        let handle = agent.spawn_updater(Duration::from_secs(1), |registry| {
            let instance = oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 0);
            let current = match registry.get(&instance).unwrap().provider.read()? {
                Value::Integer(n) => n,
                other => panic!("unexpected value {other}"),
            };
            registry.set_value(&instance, Value::Integer(current + 1))
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let value = {
            let registry = agent.registry().read().await;
            registry
                .get(&oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 0))
                .unwrap()
                .provider
                .read()
                .unwrap()
        };
        assert_eq!(value, Value::Integer(3));

        agent.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_updater_survives_failed_tick() {
        let agent = Agent::builder()
            .bind("127.0.0.1:0".parse().unwrap())
            .build()
            .await
            .unwrap();
        let handle = agent.spawn_updater(Duration::from_secs(1), |registry| {
            if registry.is_empty() {
                registry.insert_scalar(oid!(1, 3, 6, 1, 4, 1, 9999, 9), Provider::constant(1))?;
                Err(crate::error::Error::provider("transient"))
            } else {
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(agent.registry().read().await.len(), 1);

        agent.shutdown();
        handle.await.unwrap();
    }
}

//! Connection session loop
//!
//! One sequential loop per connection: the next frame, the periodic latency
//! report and the shutdown signal are awaited together, and whichever fires is
//! handled to completion before the loop awaits again. Frame processing never
//! yields, so the latency breakdown only ever measures work, not scheduling.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::info;

use crate::clock::Clock;
use crate::connection::FeedTransport;
use crate::dispatcher::StreamDispatcher;
use crate::error::Result;

/// Why a session ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Shutdown signal received; the transport was closed locally
    Shutdown,
    /// Remote side closed the connection
    Disconnected,
}

/// Subscribe, then route frames until shutdown, remote close, or a transport error
///
/// Reconnection is left to the caller.
pub async fn run_session<T, C, S>(
    transport: &mut T,
    dispatcher: &mut StreamDispatcher<C>,
    report_interval: Option<Duration>,
    shutdown: S,
) -> Result<SessionEnd>
where
    T: FeedTransport + ?Sized,
    C: Clock,
    S: Future<Output = ()>,
{
    transport.send_text(dispatcher.subscribe_request()?).await?;
    dispatcher.log_subscribed();

    let mut report = report_interval.map(|period| {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("[shutdown] Interrupted by user");
                transport.close().await?;
                return Ok(SessionEnd::Shutdown);
            }

            frame = transport.next_frame() => {
                let received_us = dispatcher.clock().now_us();
                match frame? {
                    Some(frame) => {
                        dispatcher.on_frame(&frame, received_us);
                    }
                    None => {
                        info!("[shutdown] Websocket disconnected");
                        return Ok(SessionEnd::Disconnected);
                    }
                }
            }

            _ = next_report(&mut report) => {
                dispatcher.log_latency_summary();
            }
        }
    }
}

async fn next_report(report: &mut Option<Interval>) {
    match report {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

//! Per-session handler: joins the session set, then reads commands.
//!
//! Each accepted browser connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Register the connection with the router → it starts receiving
//!      broadcasts
//!   2. Loop: receive a frame → hand it to the router as a command
//!   3. On close or read error → leave the session set

use std::sync::Arc;

use wsjtx_transport::{Connection, ConnectionId};

use crate::router::BridgeRouter;
use crate::BridgeError;

/// Drop guard that removes a session from the router when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct SessionGuard<C: Connection> {
    conn_id: ConnectionId,
    router: Arc<BridgeRouter<C>>,
}

impl<C: Connection> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let router = Arc::clone(&self.router);
        tokio::spawn(async move {
            router.unregister(conn_id).await;
        });
    }
}

/// Handles a single browser session from upgrade to close.
///
/// Command failures (bad JSON, unknown type, no peer yet, UDP send error)
/// are logged and the session keeps going. Nothing is sent back to the
/// browser for a dropped command.
pub(crate) async fn handle_connection<C: Connection>(
    conn: C,
    router: Arc<BridgeRouter<C>>,
) {
    let conn = Arc::new(conn);
    let conn_id = conn.id();

    router.register(Arc::clone(&conn)).await;
    let _guard = SessionGuard {
        conn_id,
        router: Arc::clone(&router),
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        match router.handle_command(&data).await {
            Ok(_) => {}
            Err(e @ BridgeError::Transport(_)) => {
                tracing::warn!(%conn_id, error = %e, "command send failed");
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "command dropped");
            }
        }
    }

    // _guard drops here → session leaves the set.
}

//! Long-running components sharing one shutdown token.
//!
//! The service runs a single [`Component`] today (the HTTP server), but the
//! startup path stays component-shaped so a second listener or a background
//! artifact watcher can be added without touching `main`.

use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::error::AppError;

pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// A unit that runs until `shutdown` is cancelled or its work ends.
pub trait Component: Send + 'static {
    fn id(&self) -> &str;

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

/// Run every component to completion.
///
/// A component that fails or panics cancels `shutdown` for the rest; the
/// first failure is returned once all of them have stopped.
pub async fn run_components(
    components: Vec<Box<dyn Component>>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let mut set = JoinSet::new();
    for component in components {
        let id = component.id().to_string();
        debug!(component = %id, "starting component");
        let fut = component.run(shutdown.clone());
        set.spawn(async move { (id, fut.await) });
    }

    let mut first_err = None;
    while let Some(joined) = set.join_next().await {
        let failure = match joined {
            Ok((_, Ok(()))) => continue,
            Ok((id, Err(e))) => {
                error!(component = %id, "component failed: {e}");
                e
            }
            Err(join_err) => {
                error!("component panicked: {join_err}");
                AppError::Server(format!("component panicked: {join_err}"))
            }
        };
        shutdown.cancel();
        first_err.get_or_insert(failure);
    }

    first_err.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UntilShutdown;

    impl Component for UntilShutdown {
        fn id(&self) -> &str {
            "until-shutdown"
        }

        fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
            Box::pin(async move {
                shutdown.cancelled().await;
                Ok(())
            })
        }
    }

    struct BindFails;

    impl Component for BindFails {
        fn id(&self) -> &str {
            "bind-fails"
        }

        fn run(self: Box<Self>, _shutdown: CancellationToken) -> ComponentFuture {
            Box::pin(async { Err(AppError::Server("bind failed".into())) })
        }
    }

    struct Panics;

    async fn explode() -> Result<(), AppError> {
        panic!("boom")
    }

    impl Component for Panics {
        fn id(&self) -> &str {
            "panics"
        }

        fn run(self: Box<Self>, _shutdown: CancellationToken) -> ComponentFuture {
            Box::pin(explode())
        }
    }

    #[tokio::test]
    async fn cancelled_token_stops_cleanly() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(run_components(vec![Box::new(UntilShutdown)], token).await.is_ok());
    }

    #[tokio::test]
    async fn failure_stops_the_others() {
        let token = CancellationToken::new();
        let err = run_components(vec![Box::new(UntilShutdown), Box::new(BindFails)], token.clone())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bind failed"));
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn panic_becomes_server_error() {
        let token = CancellationToken::new();
        let err = run_components(vec![Box::new(UntilShutdown), Box::new(Panics)], token.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Server(msg) if msg.contains("panicked")));
        assert!(token.is_cancelled());
    }
}

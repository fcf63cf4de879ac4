//! Consumer loops binding the lifecycle driver to its inbound topics.

use std::sync::Arc;

use futures_util::StreamExt;
use model::{Event, Topic, codec};
use transport::MessageBus;

use crate::driver::Orchestrator;
use crate::error::RouteError;

/// Spawns the orchestrator's four consumer loops.
///
/// `start-saga` feeds [`Orchestrator::start_saga`], `orchestrator` feeds
/// [`Orchestrator::continue_saga`], and the two finish topics feed the
/// terminal operations. Undecodable payloads are dropped with a warning;
/// routing errors are surfaced at error level with a metric, but one bad
/// message never kills a loop.
pub async fn spawn<B>(orchestrator: Arc<Orchestrator<B>>) -> Vec<tokio::task::JoinHandle<()>>
where
    B: MessageBus + 'static,
{
    let mut handles = Vec::with_capacity(4);

    handles.push(consume(orchestrator.clone(), Topic::StartSaga, |o, event| async move {
        report_routing(o.start_saga(event).await);
    })
    .await);

    handles.push(consume(orchestrator.clone(), Topic::Orchestrator, |o, event| async move {
        report_routing(o.continue_saga(event).await);
    })
    .await);

    handles.push(consume(orchestrator.clone(), Topic::FinishSuccess, |o, event| async move {
        o.finish_saga_success(event).await;
    })
    .await);

    handles.push(consume(orchestrator, Topic::FinishFail, |o, event| async move {
        o.finish_saga_failed(event).await;
    })
    .await);

    handles
}

fn report_routing(result: Result<(), RouteError>) {
    if let Err(error) = result {
        // A routing failure is a logic bug: continuing would silently drop
        // the saga, so it must be loud.
        metrics::counter!("saga_routing_errors_total").increment(1);
        tracing::error!(%error, "saga routing failed; event dropped");
    }
}

async fn consume<B, F, Fut>(
    orchestrator: Arc<Orchestrator<B>>,
    topic: Topic,
    handle: F,
) -> tokio::task::JoinHandle<()>
where
    B: MessageBus + 'static,
    F: Fn(Arc<Orchestrator<B>>, Event) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let mut stream = orchestrator.bus().subscribe(topic).await;
    tokio::spawn(async move {
        while let Some(payload) = stream.next().await {
            tracing::info!(%topic, "receiving event");
            if let Some(event) = codec::from_json(&payload) {
                handle(orchestrator.clone(), event).await;
            }
        }
    })
}

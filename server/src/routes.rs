use relay::{Relay, RelayResponse};
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::path::FullPath;
use warp::{Filter, Rejection, Reply};

const MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;

/// `POST <route>` submits, `GET <route>` reports health.
pub fn routes(
    relay: Relay,
    route: &str,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let on_route = exact_path(normalize_route(route));

    let submit = on_route
        .clone()
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::bytes())
        .and(with_relay(relay.clone()))
        .and_then(submit_invoice)
        .recover({
            let relay = relay.clone();
            move |err: Rejection| body_rejection(relay.clone(), err)
        });

    let health = on_route
        .and(warp::get())
        .and(with_relay(relay))
        .map(|relay: Relay| warp::reply::json(&relay.health()));

    submit.or(health).with(warp::trace::request())
}

fn normalize_route(route: &str) -> Arc<str> {
    let trimmed = route.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        Arc::from(trimmed)
    } else {
        Arc::from(format!("/{trimmed}"))
    }
}

/// The route is configurable and may span several segments, so match the
/// whole path rather than building it from `warp::path!`.
fn exact_path(route: Arc<str>) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path::full()
        .and_then(move |full: FullPath| {
            let route = Arc::clone(&route);
            async move {
                if full.as_str().trim_end_matches('/') == route.trim_end_matches('/') {
                    Ok(())
                } else {
                    Err(warp::reject::not_found())
                }
            }
        })
        .untuple_one()
}

fn with_relay(relay: Relay) -> impl Filter<Extract = (Relay,), Error = Infallible> + Clone {
    warp::any().map(move || relay.clone())
}

async fn submit_invoice(body: Bytes, relay: Relay) -> Result<impl Reply, Infallible> {
    Ok(envelope_reply(relay.submit(&body).await))
}

/// Body-limit rejections get the same envelope as every other refused
/// submission. Anything else (wrong path or method) passes through.
async fn body_rejection(relay: Relay, err: Rejection) -> Result<impl Reply, Rejection> {
    let reason = if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        format!("Request body exceeds {MAX_BODY_BYTES} bytes")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        "Request body must be sent with a Content-Length header".to_string()
    } else {
        return Err(err);
    };
    Ok(envelope_reply(relay.refuse(reason)))
}

fn envelope_reply(response: RelayResponse) -> warp::reply::WithStatus<warp::reply::Json> {
    let status =
        StatusCode::from_u16(response.outcome.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    warp::reply::with_status(warp::reply::json(&response.envelope), status)
}

//! Request routing for the dashboard.

use crate::error::Res;
use crate::model::{Product, Region, Submission};
use crate::store::Store;
use crate::view::{view_of, DashboardView};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body as HttpBody, Bytes};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

const INDEX_HTML: &str = include_str!("index.html");
/// Request bodies larger than this are refused with `413 Payload Too Large`.
const MAX_BODY_BYTES: usize = 64 * 1024;
const ROUTES: [&str; 5] = ["/", "/index.html", "/health", "/api/view", "/api/records"];

type Body = Full<Bytes>;

/// The result of one interaction: the freshly computed view and, if the submission was rejected,
/// why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Refresh {
    pub(crate) view: DashboardView,
    pub(crate) message: Option<String>,
}

/// The dashboard application: a store and the lock that keeps interactions from overlapping.
pub(crate) struct App {
    store: Box<dyn Store>,
    cycle: Mutex<()>,
}

impl App {
    pub(crate) fn new<S>(store: S) -> Self
    where
        S: Store + 'static,
    {
        Self {
            store: Box::new(store),
            cycle: Mutex::new(()),
        }
    }

    /// Makes sure the store exists before the first request.
    pub(crate) async fn initialize(&self) -> Res<()> {
        self.store.initialize().await?;
        Ok(())
    }

    pub(crate) async fn handle<B>(&self, req: Request<B>) -> Response<Body>
    where
        B: HttpBody,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let body = match Limited::new(body, MAX_BODY_BYTES).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                warn!("Refusing a request body larger than {MAX_BODY_BYTES} bytes");
                return text(StatusCode::PAYLOAD_TOO_LARGE, "payload too large");
            }
            Err(e) => {
                return text(
                    StatusCode::BAD_REQUEST,
                    format!("Unable to read the request body: {e}"),
                )
            }
        };
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        debug!("{} {}", parts.method, parts.uri.path());
        self.route(&parts.method, parts.uri.path(), content_type, &body)
            .await
    }

    pub(crate) async fn route(
        &self,
        method: &Method,
        path: &str,
        content_type: &str,
        body: &[u8],
    ) -> Response<Body> {
        match (method, path) {
            (&Method::GET, "/") | (&Method::GET, "/index.html") => html(index_page()),
            (&Method::GET, "/health") => text(StatusCode::OK, "ok"),
            (&Method::GET, "/api/view") => json(&self.refresh(None).await.view),
            (&Method::POST, "/api/records") => {
                let submission = parse_submission(content_type, body);
                json(&self.refresh(Some(submission)).await)
            }
            (_, path) if ROUTES.contains(&path) => {
                text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
            }
            _ => text(StatusCode::NOT_FOUND, "not found"),
        }
    }

    /// One interaction: append the submission if it is complete, then re-read everything and
    /// recompute the view. Incomplete submissions are ignored without comment.
    pub(crate) async fn refresh(&self, submission: Option<Submission>) -> Refresh {
        let _cycle = self.cycle.lock().await;
        let mut message = None;

        if let Some(submission) = submission {
            match submission.entry() {
                Some(entry) => match self.store.append(&entry).await {
                    Ok(record) => info!("Added {record:?}"),
                    Err(e) => {
                        warn!("Rejected submission: {e}");
                        message = Some(e.to_string());
                    }
                },
                None => debug!("Ignoring incomplete submission {submission:?}"),
            }
        }

        let view = match self.store.read_all().await {
            Ok(records) => view_of(&records),
            Err(e) => {
                error!("Unable to read records, showing an empty dashboard: {e}");
                message.get_or_insert_with(|| e.to_string());
                DashboardView::empty()
            }
        };
        Refresh { view, message }
    }
}

/// Reads a submission from a form post or a JSON body. Anything unreadable becomes an empty, and
/// therefore ignored, submission.
fn parse_submission(content_type: &str, body: &[u8]) -> Submission {
    if content_type.starts_with("application/json") {
        return serde_json::from_slice(body).unwrap_or_else(|e| {
            debug!("Unable to parse the JSON submission: {e}");
            Submission::default()
        });
    }
    let mut submission = Submission::default();
    for (key, value) in url::form_urlencoded::parse(body) {
        let value = Some(value.into_owned());
        match key.as_ref() {
            "date" => submission.date = value,
            "sales" => submission.sales = value,
            "expenses" => submission.expenses = value,
            "region" => submission.region = value,
            "product" => submission.product = value,
            _ => {}
        }
    }
    submission
}

fn index_page() -> String {
    INDEX_HTML
        .replace("{{REGION_OPTIONS}}", &select_options(&Region::ALL))
        .replace("{{PRODUCT_OPTIONS}}", &select_options(&Product::ALL))
}

fn select_options<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| {
            let v = v.to_string();
            format!("<option value=\"{v}\">{v}</option>")
        })
        .collect::<Vec<_>>()
        .join("")
}

fn respond(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Body> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn text(status: StatusCode, body: impl Into<String>) -> Response<Body> {
    respond(status, "text/plain; charset=utf-8", body.into())
}

fn html(body: String) -> Response<Body> {
    respond(StatusCode::OK, "text/html; charset=utf-8", body)
}

fn json<T: Serialize>(value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(bytes) => respond(StatusCode::OK, "application/json", bytes),
        Err(e) => {
            error!("Unable to serialize the response: {e}");
            text(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

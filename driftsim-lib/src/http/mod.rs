use std::{borrow::Cow, convert::Infallible, sync::Arc};

use rama::{
    Service,
    http::{
        Request, Response, StatusCode,
        service::web::{
            Router,
            response::{IntoResponse, Json},
        },
    },
    telemetry::tracing,
};

use serde::{Deserialize, Serialize};

use crate::drift::{Observation, SharedDriftModel};


/// Path of the drifting endpoint.
pub const DATA_PATH: &str = "/data";

pub const SUCCESS_MESSAGE: &str = "Hello, World!";
pub const SIMULATED_ERROR_MESSAGE: &str = "Simulated server error";

/// Body of a `200 OK` response on [`DATA_PATH`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataOk {
    pub message: Cow<'static, str>,
}

/// Body of a simulated `500 Internal Server Error` response on [`DATA_PATH`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataError {
    pub error: Cow<'static, str>,
}

/// Web service exposing the drifting endpoint on [`DATA_PATH`].
///
/// All requests served by (clones of) this service observe the same model.
pub fn drift_web_svc(
    model: SharedDriftModel,
) -> impl Service<Request, Output = Response, Error = Infallible> + Clone {
    Arc::new(Router::new().with_get(DATA_PATH, move || get_data(model.clone())))
}

async fn get_data(model: SharedDriftModel) -> Response {
    let now = tokio::time::Instant::now().into_std();
    let observation = model.advance(now);

    tracing::debug!(
        latency = observation.latency_secs(),
        is_erroring = observation.is_erroring,
        "simulating latency of {:.3} seconds",
        observation.latency_secs(),
    );

    // model state is final at this point,
    // a dropped request cancelling this wait has nothing to undo
    if !observation.latency.is_zero() {
        tokio::time::sleep(observation.latency).await;
    }

    observation_response(observation)
}

/// Response sent once the simulated latency has been waited out.
pub fn observation_response(observation: Observation) -> Response {
    if observation.is_erroring {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(DataError {
                error: Cow::Borrowed(SIMULATED_ERROR_MESSAGE),
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::OK,
            Json(DataOk {
                message: Cow::Borrowed(SUCCESS_MESSAGE),
            }),
        )
            .into_response()
    }
}

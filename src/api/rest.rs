use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::patients::{NewPatient, PatientError, PatientService, PatientStatus};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: PatientStatus,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub text: String,
}

/// `/api/patients` routes over a `PatientService`.
pub struct RestApi {
    service: PatientService,
}

impl RestApi {
    pub fn new(service: PatientService) -> Self {
        RestApi { service }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        self.admit()
            .or(self.active())
            .or(self.archive())
            .or(self.update_status())
            .or(self.add_note())
            .or(self.discharge())
    }

    fn admit(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let service = self.service.clone();

        warp::path!("api" / "patients")
            .and(warp::post())
            .and(warp::body::json())
            .map(move |admission: NewPatient| respond(service.admit(admission), StatusCode::CREATED))
    }

    fn active(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let service = self.service.clone();

        warp::path!("api" / "patients" / "active")
            .and(warp::get())
            .map(move || warp::reply::json(&service.active()))
    }

    fn archive(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let service = self.service.clone();

        warp::path!("api" / "patients" / "archive")
            .and(warp::get())
            .map(move || warp::reply::json(&service.archived()))
    }

    fn update_status(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let service = self.service.clone();

        warp::path!("api" / "patients" / String / "status")
            .and(warp::put())
            .and(warp::body::json())
            .map(move |id: String, body: StatusRequest| {
                respond(service.update_status(&id, body.status), StatusCode::OK)
            })
    }

    fn add_note(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let service = self.service.clone();

        warp::path!("api" / "patients" / String / "notes")
            .and(warp::post())
            .and(warp::body::json())
            .map(move |id: String, body: NoteRequest| respond(service.add_note(&id, &body.text), StatusCode::OK))
    }

    fn discharge(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let service = self.service.clone();

        warp::path!("api" / "patients" / String / "discharge")
            .and(warp::put())
            .map(move |id: String| respond(service.discharge(&id), StatusCode::OK))
    }
}

fn respond<T: Serialize>(result: Result<T, PatientError>, success: StatusCode) -> Response {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), success).into_response(),
        Err(err) => {
            let status = match err {
                PatientError::NotFound(_) => StatusCode::NOT_FOUND,
                PatientError::Validation(_) => StatusCode::BAD_REQUEST,
            };
            let body = ErrorResponse {
                message: err.to_string(),
            };
            warp::reply::with_status(warp::reply::json(&body), status).into_response()
        }
    }
}

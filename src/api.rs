use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::{
    Assignment, AssignmentPayload, CategoryPayload, Course, GradePayload, GradeSnapshot, Module,
    ModulePayload, PasswordPayload, ProfilePayload, ScheduleBlock, Student, Submission,
    TeacherProfile,
};

/// Error body shape the backend uses for rejections.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    status: Option<u16>,
    detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("authorization rejected by the backend")]
    Unauthorized,
    #[error("backend rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("could not decode backend response: {0}")]
    BadResponse(String),
}

impl ApiError {
    /// Stable code for the IPC error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "network_error",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Rejected { .. } => "server_rejected",
            ApiError::BadResponse(_) => "bad_response",
        }
    }
}

/// Blocking client for the academic REST backend. One instance per
/// configured session; every call carries the bearer token and a fresh
/// correlation id. No retries: a failure surfaces once and the prior
/// snapshot stays in place on the shell side.
pub struct ApiClient {
    base_url: String,
    token: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send<T: DeserializeOwned>(&self, rb: RequestBuilder, path: &str) -> Result<T, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(path, %request_id, "backend request");
        let resp = rb
            .bearer_auth(&self.token)
            .header("X-Request-Id", request_id)
            .send()?;
        let resp = Self::check(resp)?;
        let text = resp.text()?;
        serde_json::from_str(&text).map_err(|e| ApiError::BadResponse(e.to_string()))
    }

    /// Variant for endpoints whose success body is empty or irrelevant.
    fn send_no_body(&self, rb: RequestBuilder, path: &str) -> Result<(), ApiError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(path, %request_id, "backend request");
        let resp = rb
            .bearer_auth(&self.token)
            .header("X-Request-Id", request_id)
            .send()?;
        Self::check(resp).map(|_| ())
    }

    fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let detail = resp
                .json::<ErrorBody>()
                .map(|b| b.detail)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request rejected")
                        .to_string()
                });
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(resp)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(self.http.get(self.url(path)), path)
    }

    // Courses and rosters.

    pub fn my_courses(&self) -> Result<Vec<Course>, ApiError> {
        self.get("/api/docentes/todos-mis-cursos")
    }

    pub fn course(&self, course_id: &str) -> Result<Course, ApiError> {
        self.get(&format!("/api/cursos/{}", course_id))
    }

    pub fn course_roster(&self, course_id: &str) -> Result<Vec<Student>, ApiError> {
        self.get(&format!("/api/cursos/{}/estudiantes", course_id))
    }

    pub fn my_students(&self) -> Result<Vec<Student>, ApiError> {
        self.get("/api/docentes/mis-estudiantes")
    }

    pub fn grade_snapshot(&self, course_id: &str) -> Result<GradeSnapshot, ApiError> {
        self.get(&format!("/api/calificaciones/curso/{}/completo", course_id))
    }

    // Modules and categories.

    pub fn modules_by_course(&self, course_id: &str) -> Result<Vec<Module>, ApiError> {
        self.get(&format!("/api/modulos/curso/{}", course_id))
    }

    pub fn module(&self, module_id: &str) -> Result<Module, ApiError> {
        self.get(&format!("/api/modulos/{}", module_id))
    }

    pub fn create_module(&self, payload: &ModulePayload) -> Result<Module, ApiError> {
        let path = "/api/modulos";
        self.send(self.http.post(self.url(path)).json(payload), path)
    }

    pub fn update_module(&self, module_id: &str, payload: &ModulePayload) -> Result<Module, ApiError> {
        let path = format!("/api/modulos/{}", module_id);
        self.send(self.http.put(self.url(&path)).json(payload), &path)
    }

    pub fn delete_module(&self, module_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/modulos/{}", module_id);
        self.send_no_body(self.http.delete(self.url(&path)), &path)
    }

    /// The four lifecycle toggles: cerrar, reabrir, publicar-promedios,
    /// ocultar-promedios.
    pub fn module_lifecycle(&self, module_id: &str, action: &str) -> Result<Module, ApiError> {
        let path = format!("/api/modulos/{}/{}", module_id, action);
        self.send(self.http.put(self.url(&path)), &path)
    }

    pub fn create_category(
        &self,
        module_id: &str,
        payload: &CategoryPayload,
    ) -> Result<Module, ApiError> {
        let path = format!("/api/modulos/{}/categorias", module_id);
        self.send(self.http.post(self.url(&path)).json(payload), &path)
    }

    // Assignments.

    pub fn assignments_by_module(&self, module_id: &str) -> Result<Vec<Assignment>, ApiError> {
        self.get(&format!("/api/tareas/modulo/{}", module_id))
    }

    pub fn assignment(&self, assignment_id: &str) -> Result<Assignment, ApiError> {
        self.get(&format!("/api/tareas/{}", assignment_id))
    }

    pub fn create_assignment(&self, payload: &AssignmentPayload) -> Result<Assignment, ApiError> {
        let path = "/api/tareas";
        self.send(self.http.post(self.url(path)).json(payload), path)
    }

    pub fn update_assignment(
        &self,
        assignment_id: &str,
        payload: &AssignmentPayload,
    ) -> Result<Assignment, ApiError> {
        let path = format!("/api/tareas/{}", assignment_id);
        self.send(self.http.put(self.url(&path)).json(payload), &path)
    }

    pub fn delete_assignment(&self, assignment_id: &str) -> Result<(), ApiError> {
        let path = format!("/api/tareas/{}", assignment_id);
        self.send_no_body(self.http.delete(self.url(&path)), &path)
    }

    // Submissions and grading.

    pub fn submissions_by_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<Submission>, ApiError> {
        self.get(&format!("/api/entregas/tarea/{}", assignment_id))
    }

    pub fn grade_submission(
        &self,
        submission_id: &str,
        payload: &GradePayload,
    ) -> Result<(), ApiError> {
        let path = format!("/api/entregas/{}/calificar", submission_id);
        self.send_no_body(self.http.post(self.url(&path)).json(payload), &path)
    }

    // Teacher-scoped views and profile self-service.

    pub fn my_schedule(&self) -> Result<Vec<ScheduleBlock>, ApiError> {
        self.get("/api/docentes/mi-horario")
    }

    pub fn me(&self) -> Result<TeacherProfile, ApiError> {
        self.get("/api/auth/me")
    }

    pub fn update_me(&self, payload: &ProfilePayload) -> Result<TeacherProfile, ApiError> {
        let path = "/api/auth/me";
        self.send(self.http.put(self.url(path)).json(payload), path)
    }

    pub fn change_password(&self, payload: &PasswordPayload) -> Result<(), ApiError> {
        let path = "/api/usuarios/cambiar-password";
        self.send_no_body(self.http.put(self.url(path)).json(payload), path)
    }
}

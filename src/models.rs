use serde::{Deserialize, Serialize};

/// Wire types for the academic REST backend. Field names on the wire are
/// Spanish; the contract is consumed here, not defined.

#[derive(Debug, Clone, Deserialize)]
pub struct Student {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    #[serde(rename = "cedula")]
    pub national_id: String,
    // Present only in teacher-wide listings (mis-estudiantes).
    #[serde(rename = "curso", default)]
    pub course_name: Option<String>,
    #[serde(rename = "codigo_curso", default)]
    pub course_code: Option<String>,
    #[serde(rename = "estado", default)]
    pub enrollment_state: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "cantidad_estudiantes", default)]
    pub student_count: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ModuleState {
    #[serde(rename = "abierto")]
    Open,
    #[serde(rename = "cerrado")]
    Closed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "ponderacion")]
    pub weight: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Module {
    pub id: String,
    #[serde(rename = "id_curso")]
    pub course_id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fecha_inicio", default)]
    pub start_date: Option<String>,
    #[serde(rename = "fecha_fin", default)]
    pub end_date: Option<String>,
    #[serde(rename = "estado")]
    pub state: ModuleState,
    #[serde(rename = "promedios_publicados", default)]
    pub averages_published: bool,
    #[serde(rename = "categorias", default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    pub id: String,
    #[serde(rename = "id_modulo")]
    pub module_id: String,
    #[serde(rename = "id_categoria", default)]
    pub category_id: Option<String>,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "puntaje_maximo")]
    pub max_score: f64,
    // Informational only; classification always compares against the fixed
    // pass mark, never against this field.
    #[serde(rename = "nota_minima", default)]
    pub min_passing_score: Option<f64>,
    #[serde(rename = "ponderacion")]
    pub weight: f64,
    #[serde(rename = "fecha_limite", default)]
    pub due_date: Option<String>,
    #[serde(rename = "permite_archivo", default)]
    pub allows_file: bool,
    #[serde(rename = "formatos_permitidos", default)]
    pub allowed_formats: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionState {
    Pending,
    Graded,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: String,
    #[serde(rename = "id_tarea")]
    pub assignment_id: String,
    #[serde(rename = "id_estudiante")]
    pub student_id: String,
    #[serde(rename = "estudiante", default)]
    pub student_name: Option<String>,
    #[serde(rename = "fecha_envio", default)]
    pub submitted_at: Option<String>,
    #[serde(rename = "archivo_url", default)]
    pub file_url: Option<String>,
    #[serde(rename = "nota", default)]
    pub score: Option<f64>,
    #[serde(rename = "comentario", default)]
    pub comment: Option<String>,
}

impl Submission {
    pub fn state(&self) -> SubmissionState {
        if self.score.is_some() {
            SubmissionState::Graded
        } else {
            SubmissionState::Pending
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoreEntry {
    #[serde(rename = "id_estudiante")]
    pub student_id: String,
    #[serde(rename = "id_tarea")]
    pub assignment_id: String,
    #[serde(rename = "nota", default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleAverageEntry {
    #[serde(rename = "id_estudiante")]
    pub student_id: String,
    #[serde(rename = "id_modulo")]
    pub module_id: String,
    #[serde(rename = "promedio")]
    pub average: f64,
}

/// The pre-aggregated course snapshot from
/// `GET /api/calificaciones/curso/:id/completo`.
#[derive(Debug, Clone, Deserialize)]
pub struct GradeSnapshot {
    #[serde(rename = "estudiantes")]
    pub students: Vec<Student>,
    #[serde(rename = "tareas")]
    pub assignments: Vec<Assignment>,
    #[serde(rename = "calificaciones")]
    pub scores: Vec<ScoreEntry>,
    #[serde(rename = "promedios_modulo", default)]
    pub module_averages: Vec<ModuleAverageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleBlock {
    #[serde(rename = "dia")]
    pub day: String,
    #[serde(rename = "hora_inicio")]
    pub start_time: String,
    #[serde(rename = "hora_fin")]
    pub end_time: String,
    #[serde(rename = "curso")]
    pub course_name: String,
    #[serde(rename = "codigo_curso", default)]
    pub course_code: Option<String>,
    #[serde(rename = "aula", default)]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeacherProfile {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "apellido")]
    pub surname: String,
    pub email: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
}

// Mutation payloads. Serialized with the backend's field names.

#[derive(Debug, Clone, Serialize)]
pub struct ModulePayload {
    #[serde(rename = "id_curso")]
    pub course_id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fecha_inicio", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(rename = "fecha_fin", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryPayload {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "ponderacion")]
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentPayload {
    #[serde(rename = "id_modulo")]
    pub module_id: String,
    #[serde(rename = "id_categoria", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "puntaje_maximo")]
    pub max_score: f64,
    #[serde(rename = "nota_minima", skip_serializing_if = "Option::is_none")]
    pub min_passing_score: Option<f64>,
    #[serde(rename = "ponderacion")]
    pub weight: f64,
    #[serde(rename = "fecha_limite", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(rename = "permite_archivo")]
    pub allows_file: bool,
    #[serde(rename = "formatos_permitidos")]
    pub allowed_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GradePayload {
    #[serde(rename = "nota")]
    pub score: f64,
    #[serde(rename = "comentario", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfilePayload {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "apellido", skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordPayload {
    #[serde(rename = "actual")]
    pub current: String,
    #[serde(rename = "nueva")]
    pub new: String,
}

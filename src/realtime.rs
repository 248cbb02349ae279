use serde::Serialize;

/// Consumption side of the realtime push channel. Each named event maps to
/// a toast and, at most, one resource the shell should re-fetch. No
/// ordering or delivery guarantees exist or are assumed: a refresh always
/// converges on the server-authoritative state.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    Submissions,
    Assignments,
    Modules,
    Grades,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Refresh {
    pub resource: Resource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toast: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<Refresh>,
}

fn payload_id(payload: &serde_json::Value, key: &str) -> Option<String> {
    let v = payload.get(key)?;
    if let Some(s) = v.as_str() {
        return Some(s.to_string());
    }
    v.as_i64().map(|n| n.to_string())
}

/// Resolve a named push event into its toast and refresh target. Unknown
/// events are acknowledged with neither; dropping them silently is the
/// whole contract.
pub fn resolve(event: &str, payload: &serde_json::Value) -> Notification {
    let (toast, resource, id_key) = match event {
        "entrega_nueva" => ("Nueva entrega recibida", Resource::Submissions, "id_tarea"),
        "entrega_actualizada" => ("Entrega actualizada", Resource::Submissions, "id_tarea"),
        "tarea_entregada_docente" => (
            "Un estudiante entregó una tarea",
            Resource::Submissions,
            "id_tarea",
        ),
        "entrega_calificada" => ("Entrega calificada", Resource::Submissions, "id_tarea"),
        "calificacion_actualizada" => (
            "Calificaciones actualizadas",
            Resource::Grades,
            "id_curso",
        ),
        "modulo_creado" => ("Módulo creado", Resource::Modules, "id_curso"),
        "nueva_tarea" => ("Nueva tarea publicada", Resource::Assignments, "id_modulo"),
        _ => {
            return Notification {
                toast: None,
                refresh: None,
            }
        }
    };
    Notification {
        toast: Some(toast.to_string()),
        refresh: Some(Refresh {
            resource,
            id: payload_id(payload, id_key),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submission_events_refresh_submission_lists() {
        for event in [
            "entrega_nueva",
            "entrega_actualizada",
            "tarea_entregada_docente",
            "entrega_calificada",
        ] {
            let n = resolve(event, &json!({ "id_tarea": "t1" }));
            let refresh = n.refresh.expect("refresh target");
            assert_eq!(refresh.resource, Resource::Submissions);
            assert_eq!(refresh.id.as_deref(), Some("t1"));
            assert!(n.toast.is_some());
        }
    }

    #[test]
    fn grade_and_module_events_carry_course_id() {
        let n = resolve("calificacion_actualizada", &json!({ "id_curso": 42 }));
        assert_eq!(
            n.refresh,
            Some(Refresh {
                resource: Resource::Grades,
                id: Some("42".to_string())
            })
        );

        let n = resolve("modulo_creado", &json!({ "id_curso": "c1" }));
        assert_eq!(n.refresh.expect("refresh").resource, Resource::Modules);
    }

    #[test]
    fn new_assignment_event_refreshes_module_assignments() {
        let n = resolve("nueva_tarea", &json!({ "id_modulo": "m3" }));
        let refresh = n.refresh.expect("refresh target");
        assert_eq!(refresh.resource, Resource::Assignments);
        assert_eq!(refresh.id.as_deref(), Some("m3"));
    }

    #[test]
    fn unknown_event_is_acknowledged_without_refresh() {
        let n = resolve("mantenimiento_programado", &json!({}));
        assert_eq!(
            n,
            Notification {
                toast: None,
                refresh: None
            }
        );
    }

    #[test]
    fn missing_payload_id_still_notifies() {
        let n = resolve("entrega_nueva", &json!({}));
        let refresh = n.refresh.expect("refresh target");
        assert_eq!(refresh.id, None);
    }
}

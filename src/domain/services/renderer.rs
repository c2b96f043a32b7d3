use chrono::{DateTime, Utc};
use serde_json::Value;
use tera::{Context, Tera};

use crate::domain::models::notification::{NotificationAction, NotificationIntent, NotificationPayload, NotificationType};
use crate::error::AppError;

struct PayloadTemplates {
    title: &'static str,
    body: &'static str,
    path: &'static str,
}

fn templates_for(kind: NotificationType) -> PayloadTemplates {
    match kind {
        NotificationType::NewReservation => PayloadTemplates {
            title: "New booking: {{ customer_name }}",
            body: "{{ service_name | default(value=\"Appointment\") }} on {{ date }} at {{ time }}",
            path: "/barber/reservations/{{ reservation_id }}",
        },
        NotificationType::ReservationCancelled => PayloadTemplates {
            title: "Your appointment was cancelled",
            body: "{{ date }} at {{ time }}{% if reason is defined %} ({{ reason }}){% endif %}",
            path: "/reservations",
        },
        NotificationType::Reminder => PayloadTemplates {
            title: "Reminder: your appointment at {{ time }}",
            body: "See you on {{ date }} at {{ time }}{% if barber_name is defined %} with {{ barber_name }}{% endif %}",
            path: "/reservations/{{ reservation_id }}",
        },
        NotificationType::Broadcast => PayloadTemplates {
            title: "{{ title }}",
            body: "{{ body }}",
            path: "{{ path | default(value=\"/\") }}",
        },
    }
}

fn actions_for(kind: NotificationType) -> Vec<NotificationAction> {
    let action = |action: &str, title: &str| NotificationAction { action: action.to_string(), title: title.to_string() };
    match kind {
        NotificationType::NewReservation => vec![action("view", "View booking")],
        NotificationType::ReservationCancelled => vec![action("rebook", "Book again")],
        NotificationType::Reminder => vec![action("view", "Details"), action("cancel", "Cancel")],
        NotificationType::Broadcast => Vec::new(),
    }
}

/// Turns an intent into the payload delivered to the client service worker.
pub struct NotificationRenderer {
    tera: Tera,
    base_url: String,
}

impl NotificationRenderer {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let mut tera = Tera::default();
        for kind in [NotificationType::NewReservation, NotificationType::ReservationCancelled, NotificationType::Reminder, NotificationType::Broadcast] {
            let t = templates_for(kind);
            tera.add_raw_templates(vec![
                (format!("{}.title", kind.as_str()), t.title),
                (format!("{}.body", kind.as_str()), t.body),
                (format!("{}.path", kind.as_str()), t.path),
            ]).map_err(|e| AppError::InternalWithMsg(format!("Tera parse error: {:?}", e)))?;
        }
        Ok(Self { tera, base_url: base_url.into().trim_end_matches('/').to_string() })
    }

    pub fn render(&self, intent: &NotificationIntent, now: DateTime<Utc>) -> Result<NotificationPayload, AppError> {
        let mut data = match &intent.context {
            Value::Object(map) => map.clone(),
            Value::Null => serde_json::Map::new(),
            _ => return Err(AppError::Validation("notification context must be an object".into())),
        };
        if let Some(id) = &intent.reservation_id {
            data.entry("reservation_id").or_insert_with(|| Value::String(id.clone()));
        }
        let context = Context::from_value(Value::Object(data))
            .map_err(|e| AppError::Validation(format!("invalid notification context: {}", e)))?;

        let kind = intent.notification_type;
        let render = |part: &str| {
            self.tera.render(&format!("{}.{}", kind.as_str(), part), &context)
                .map_err(|e| AppError::Validation(format!("cannot render {} {}: {}", kind.as_str(), part, e)))
        };
        let path = render("path")?;

        Ok(NotificationPayload {
            title: render("title")?,
            body: render("body")?,
            url: format!("{}{}", self.base_url, path),
            actions: actions_for(kind),
            tag: match &intent.reservation_id {
                Some(id) => format!("reservation-{}", id),
                None => kind.as_str().to_string(),
            },
            notification_type: kind,
            reservation_id: intent.reservation_id.clone(),
            skip_badge: kind.skips_badge(),
            timestamp: now.timestamp_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::subscription::Recipient;
    use serde_json::json;

    fn intent(kind: NotificationType, reservation_id: Option<&str>, context: Value) -> NotificationIntent {
        NotificationIntent {
            notification_type: kind,
            recipient: Recipient::customer("c1"),
            reservation_id: reservation_id.map(str::to_string),
            sender_id: None,
            context,
        }
    }

    #[test]
    fn test_new_reservation_payload() {
        let renderer = NotificationRenderer::new("https://shop.example/").unwrap();
        let payload = renderer.render(
            &intent(NotificationType::NewReservation, Some("r1"), json!({"customer_name": "Dana", "date": "2030-01-01", "time": "11:00"})),
            Utc::now(),
        ).unwrap();
        assert_eq!(payload.title, "New booking: Dana");
        assert_eq!(payload.body, "Appointment on 2030-01-01 at 11:00");
        assert_eq!(payload.url, "https://shop.example/barber/reservations/r1");
        assert_eq!(payload.tag, "reservation-r1");
        assert!(!payload.skip_badge);
    }

    #[test]
    fn test_broadcast_skips_badge() {
        let renderer = NotificationRenderer::new("https://shop.example").unwrap();
        let payload = renderer.render(
            &intent(NotificationType::Broadcast, None, json!({"title": "Holiday hours", "body": "Closed Monday"})),
            Utc::now(),
        ).unwrap();
        assert!(payload.skip_badge);
        assert_eq!(payload.url, "https://shop.example/");
        assert_eq!(payload.tag, "broadcast");
    }

    #[test]
    fn test_missing_required_variable_is_rejected() {
        let renderer = NotificationRenderer::new("https://shop.example").unwrap();
        let result = renderer.render(&intent(NotificationType::Reminder, Some("r1"), json!({"date": "2030-01-01"})), Utc::now());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}

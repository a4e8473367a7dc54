use super::notifier::Notification;
use super::repository::ResolvedSubscription;
use crate::scoring::Score;

/// Plain-text alert for a subscription that passed every check.
pub fn compose_alert(
    subscription: &ResolvedSubscription<'_>,
    score: &Score,
    kp_index: f64,
    cloud_coverage: f64,
) -> Notification {
    let location = subscription.location;
    let subject = format!("Aurora alert for {}: Kp {}", location.name, kp_index);

    let mut lines = vec![
        format!("Hi {},", subscription.display_name.unwrap_or("there")),
        String::new(),
        format!(
            "Conditions look good for aurora viewing near {}.",
            location.name
        ),
        format!(
            "Score: {} ({})",
            score.total_score, score.viewing_recommendation
        ),
        format!("Kp index: {}", kp_index),
        format!("Cloud cover: {}%", cloud_coverage),
    ];
    if let Some(bortle) = location.bortle_class() {
        lines.push(format!("Light pollution (Bortle): {}", bortle.value()));
    }
    lines.push(String::new());
    lines.push("Safe travels and clear skies!".to_string());

    Notification {
        recipient: subscription.recipient.to_string(),
        subject,
        body: lines.join("\n"),
    }
}

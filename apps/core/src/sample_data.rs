//! Demonstration data for a fresh database.

use tracing::info;

use crate::error::AppError;
use crate::models::{Feedback, FeedbackStatus, FeedbackUpdate, NewFeedback};
use crate::service::FeedbackService;
use crate::triage::{Category, Severity};

const SEED_ADMIN: &str = "admin@city.gov";

fn sample(
    submitter: &str,
    title: &str,
    description: &str,
    category: Option<Category>,
    severity: Option<Severity>,
    location: &str,
) -> NewFeedback {
    NewFeedback {
        submitter: submitter.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        category,
        severity,
        location_detail: Some(location.to_string()),
    }
}

/// Reports covering every category, some with submitter-chosen labels.
pub fn sample_feedback() -> Vec<NewFeedback> {
    vec![
        sample(
            "ahmed@example.com",
            "Broken Traffic Signal at Dhanmondi 27",
            "The traffic signal at Dhanmondi 27 intersection has been malfunctioning for 3 days. It's causing major traffic jams and accidents. Please fix urgently.",
            Some(Category::Traffic),
            Some(Severity::High),
            "Dhanmondi 27 intersection",
        ),
        sample(
            "fatima@example.com",
            "Garbage Collection Not Regular",
            "Garbage has not been collected from our street for over a week. The smell is terrible and it's becoming a health hazard.",
            Some(Category::Sanitation),
            Some(Severity::Medium),
            "Road 15, Gulshan 1",
        ),
        sample(
            "ali@example.com",
            "Street Lights Not Working",
            "Multiple street lights on our road have been out for months. It's very dangerous at night, especially for women and children.",
            Some(Category::Electricity),
            Some(Severity::High),
            "Block C, Uttara Sector 7",
        ),
        sample(
            "rashida@example.com",
            "Water pipe leak",
            "A water pipe has burst near the market and the street is flooding. Supply to nearby homes is affected.",
            None,
            None,
            "Mirpur 10 market",
        ),
        sample(
            "karim@example.com",
            "Theft near the bus stand",
            "Several phone thefts reported at night near the bus stand. The area feels unsafe without police patrols.",
            None,
            None,
            "Wari bus stand",
        ),
        sample(
            "shahana@example.com",
            "Cracked sidewalk",
            "The sidewalk outside the library is cracked and needs repair before someone trips.",
            None,
            None,
            "Banani public library",
        ),
        sample(
            "rafiq@example.com",
            "Noise from late night events",
            "The community hall hosts loud events past midnight on weekdays.",
            None,
            Some(Severity::Low),
            "Mohammadpur community hall",
        ),
        sample(
            "nasir@example.com",
            "Dhanmondi 27 signal still out",
            "Signal still not working this morning, traffic police had to direct vehicles.",
            None,
            None,
            "Dhanmondi 27 intersection",
        ),
    ]
}

/// Submit the sample reports and move some of them along the workflow.
pub async fn seed(service: &FeedbackService) -> Result<Vec<Feedback>, AppError> {
    let mut stored = Vec::new();

    for (i, new) in sample_feedback().into_iter().enumerate() {
        let submission = service.submit(new).await?;
        let feedback = submission.feedback;
        let category = feedback
            .category
            .as_deref()
            .unwrap_or("general")
            .to_lowercase();

        let update = if i % 4 == 0 {
            Some(FeedbackUpdate {
                status: Some(FeedbackStatus::Resolved),
                official_response: Some(format!(
                    "This {category} issue has been resolved. Thank you for your patience."
                )),
                ..Default::default()
            })
        } else if i % 3 == 0 {
            Some(FeedbackUpdate {
                status: Some(FeedbackStatus::InProgress),
                official_response: Some(format!(
                    "We are working on this {category} issue. Expected completion in 2-3 days."
                )),
                ..Default::default()
            })
        } else {
            None
        };

        let feedback = match update {
            Some(update) => service.update(feedback.id, update, SEED_ADMIN).await?,
            None => feedback,
        };
        stored.push(feedback);
    }

    info!(count = stored.len(), "Sample data created");
    Ok(stored)
}

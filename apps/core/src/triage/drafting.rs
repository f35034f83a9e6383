//! Template-based drafting of citizen responses and administrator action plans.

use super::category::Category;
use super::severity::Severity;

/// Department responsible for a category
pub fn department(category: Category) -> &'static str {
    match category {
        Category::Traffic => "Transportation Department",
        Category::Safety => "Public Safety Department",
        Category::Water => "Water Utilities Department",
        Category::Sanitation => "Waste Management Department",
        Category::Electricity => "Power Utilities Department",
        Category::Infrastructure => "Public Works Department",
        Category::Other => "General Services Department",
    }
}

/// Target window for the first field response
pub fn response_timeline(severity: Option<Severity>) -> &'static str {
    match severity {
        Some(Severity::High) => "24 hours",
        Some(Severity::Medium) => "2-3 days",
        Some(Severity::Low) => "1-2 weeks",
        None => "1 week",
    }
}

fn templated_response(category: Category, severity: Severity) -> Option<&'static str> {
    use Category::*;
    use Severity::*;

    let text = match (category, severity) {
        (Traffic, High) => "Thank you for reporting this urgent traffic issue. This has been flagged for immediate attention by our transportation department. Please avoid the area if possible and use alternate routes for safety.",
        (Traffic, Medium) => "Your traffic concern has been received and will be addressed by our transportation team. We expect to review this within 2-3 business days.",
        (Traffic, Low) => "Thank you for your traffic feedback. This will be included in our routine maintenance planning and review cycle.",

        (Safety, High) => "This safety issue has been marked as high priority. If there is immediate danger, please contact emergency services. Our public safety team will investigate promptly.",
        (Safety, Medium) => "Your safety concern is important to us. Our team will review this issue and take appropriate action within 24-48 hours.",
        (Safety, Low) => "Thank you for reporting this safety concern. We will include this in our regular safety assessments and patrol considerations.",

        (Water, High) => "This water issue has been escalated to our utilities emergency team. If you have no water access, please contact our emergency hotline immediately.",
        (Water, Medium) => "Your water system concern has been received. Our utilities team will investigate and respond within 1-2 business days.",
        (Water, Low) => "Thank you for the water system feedback. This will be reviewed in our next maintenance cycle.",

        (Sanitation, High) => "This sanitation issue requires immediate attention. Our waste management team has been notified and will address this urgently.",
        (Sanitation, Medium) => "Your sanitation concern has been forwarded to our waste management department for prompt action.",
        (Sanitation, Low) => "Thank you for your sanitation feedback. This will be included in our regular collection and maintenance schedule.",

        (Electricity, High) => "This electrical issue has been reported to our power utility emergency team. If there are safety concerns, please maintain distance and contact our emergency line.",
        (Electricity, Medium) => "Your electrical system report has been received. Our power utilities team will investigate within 24 hours.",
        (Electricity, Low) => "Thank you for the electrical system feedback. This will be reviewed in our routine maintenance planning.",

        (Infrastructure, _) | (Other, _) => return None,
    };
    Some(text)
}

/// Acknowledgement shown to the citizen right after submission.
pub fn fallback_response(category: Category, severity: Severity) -> String {
    match templated_response(category, severity) {
        Some(text) => text.to_string(),
        None => format!(
            "Thank you for your {} feedback. This {} priority issue has been received and will be reviewed by the appropriate department.",
            category.label().to_lowercase(),
            severity.label().to_lowercase()
        ),
    }
}

/// Structured plan for the department handling the report.
pub fn fallback_action_plan(category: Category, severity: Severity) -> String {
    let timeline = response_timeline(Some(severity));
    let department = department(category);

    format!(
        "**ACTION PLAN - {severity} Priority {category} Issue**\n\
         \n\
         **Immediate Actions:**\n\
         • Assign to {department}\n\
         • Conduct field assessment within {timeline}\n\
         • Contact citizen for additional details if needed\n\
         \n\
         **Resources Required:**\n\
         • Field inspection team\n\
         • {equipment} repair equipment and materials\n\
         • Safety equipment and protocols\n\
         \n\
         **Timeline:** {timeline} for initial response and assessment\n\
         \n\
         **Responsible Department:** {department}\n\
         \n\
         **Follow-up Steps:**\n\
         • Provide status update to citizen within 48 hours\n\
         • Monitor progress until completion\n\
         • Final resolution confirmation and closure\n",
        equipment = category.label().to_lowercase(),
    )
}

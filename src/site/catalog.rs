use nylah_schema::ServiceRow;

use super::forms::ServiceType;

/// Catalog shown when the store has no services yet.
pub fn default_services() -> Vec<ServiceRow> {
    vec![
        service(
            ServiceType::Web,
            "Next-Gen Web Development",
            "Autonomous websites with built-in AI and cutting-edge design.",
            "$200.000 CLP",
            &[
                "Graphic design to your specifications or references.",
                "Unlimited sections and interactions for the same price.",
                "Optimized for search engines and AI assistants.",
                "AI secretary (Nylah) that answers by voice and drives the site.",
                "Ongoing technical support.",
                "You pay only once it is installed and working.",
            ],
        ),
        service(
            ServiceType::Mobile,
            "Mobile Apps (Android & iOS)",
            "Custom apps focused on UX and high performance.",
            "Custom quote",
            &[
                "Native or cross-platform.",
                "Intuitive, easy-to-use design.",
                "Full integration with APIs and databases.",
                "Guaranteed scalability.",
                "Fair budget according to complexity.",
            ],
        ),
        service(
            ServiceType::Software,
            "Custom Management Software",
            "Systems designed to optimize and automate your processes.",
            "Custom quote",
            &[
                "Adapted to any workflow.",
                "Advanced roles and permissions.",
                "Real-time reports and statistics.",
                "Automation of internal tasks.",
                "High security standards.",
            ],
        ),
    ]
}

fn service(
    kind: ServiceType,
    title: &str,
    description: &str,
    price: &str,
    features: &[&str],
) -> ServiceRow {
    ServiceRow {
        id: kind.as_str().to_string(),
        title: title.to_string(),
        description: description.to_string(),
        price: price.to_string(),
        features: features.iter().map(|f| f.to_string()).collect(),
        icon: kind.as_str().to_string(),
    }
}

/// Unknown icon tags render as the web icon.
pub fn icon_for(tag: &str) -> ServiceType {
    tag.parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_three_service_types() {
        let services = default_services();
        let ids: Vec<&str> = services.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["web", "mobile", "software"]);
        assert_eq!(services[0].price, "$200.000 CLP");
        assert!(services.iter().all(|s| !s.features.is_empty()));
    }

    #[test]
    fn unknown_icons_fall_back_to_web() {
        assert_eq!(icon_for("software"), ServiceType::Software);
        assert_eq!(icon_for("rocket"), ServiceType::Web);
    }
}

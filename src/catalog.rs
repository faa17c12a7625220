//! Static display data for the site: teams, sponsor packages, contact
//! points. Pure description, no mutation.
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct Team {
    pub name: &'static str,
    pub players: u32,
    pub age_bracket: &'static str,
    pub training: &'static str,
    pub description: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct SponsorPackage {
    pub name: &'static str,
    pub price: &'static str,
    pub period: &'static str,
    pub features: &'static [&'static str],
    pub highlight: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContactPoint {
    pub title: &'static str,
    pub details: &'static [&'static str],
}

pub fn teams() -> &'static [Team] {
    &[
        Team {
            name: "Seniors",
            players: 25,
            age_bracket: "18+",
            training: "Tue & Fri 20:00",
            description: "Our first squad, where experienced players and new talent take the field together.",
        },
        Team {
            name: "Women",
            players: 20,
            age_bracket: "16+",
            training: "Tue & Fri 20:00",
            description: "A strong women's side proving rugby is a sport for everyone.",
        },
        Team {
            name: "Minis",
            players: 53,
            age_bracket: "6-12",
            training: "Tue & Thu 18:45",
            description: "Our youngest players learn the basics of rugby and teamwork here.",
        },
        Team {
            name: "Cubs",
            players: 22,
            age_bracket: "12-14",
            training: "Tue & Thu 18:45",
            description: "Technique and tactics take center stage for this age group.",
        },
        Team {
            name: "Juniors",
            players: 18,
            age_bracket: "14-16",
            training: "Tue & Thu 18:45",
            description: "Preparation for senior rugby with a focus on personal growth.",
        },
        Team {
            name: "Colts",
            players: 16,
            age_bracket: "16-18",
            training: "Tue & Thu 18:45",
            description: "The last stop before moving up to senior rugby.",
        },
    ]
}

pub fn sponsor_packages() -> &'static [SponsorPackage] {
    &[
        SponsorPackage {
            name: "Scrum Master",
            price: "€2,500",
            period: "per year",
            features: &[
                "Logo on all shirts and training wear",
                "Prominent mention on the website homepage",
                "Name announcements during matches",
                "VIP access to home matches",
                "Four free tickets per match",
                "Annual sponsor dinner",
            ],
            highlight: true,
        },
        SponsorPackage {
            name: "Line-out Leader",
            price: "€1,500",
            period: "per year",
            features: &[
                "Logo on training shirts",
                "Mention on the website sponsor page",
                "Social media posts",
                "Two free tickets per match",
                "Invitation to the sponsor dinner",
            ],
            highlight: false,
        },
        SponsorPackage {
            name: "Team Player",
            price: "€750",
            period: "per year",
            features: &[
                "Logo on club materials",
                "Mention on the website",
                "Newsletter mention",
                "One free ticket per match",
            ],
            highlight: false,
        },
    ]
}

pub fn contact_points() -> &'static [ContactPoint] {
    &[
        ContactPoint {
            title: "Address",
            details: &["Sportpark De Weide 3", "4003 KX Tiel"],
        },
        ContactPoint {
            title: "Email",
            details: &["info@rugbyclub-tiel.example"],
        },
        ContactPoint {
            title: "Clubhouse phone",
            details: &["0344 123456"],
        },
        ContactPoint {
            title: "Training hours",
            details: &["Tue & Thu 18:45 - 20:30", "Fri 20:00 - 22:00"],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_nonempty_and_consistent() {
        assert_eq!(teams().len(), 6);
        assert_eq!(sponsor_packages().len(), 3);
        assert_eq!(
            sponsor_packages()
                .iter()
                .filter(|pkg| pkg.highlight)
                .count(),
            1
        );
        assert!(contact_points().iter().all(|c| !c.details.is_empty()));
    }
}

//! NTA syllabus for JEE Mains, subject → ordered topic list.

use crate::models::Subject;

const PHYSICS: &[&str] = &[
    "Units and Measurements",
    "Kinematics",
    "Laws of Motion",
    "Work Energy Power",
    "Rotational Motion",
    "Gravitation",
    "Thermodynamics",
    "Kinetic Theory",
    "Waves",
    "Electrostatics",
    "Current Electricity",
    "Magnetism",
    "EM Induction and AC",
    "Optics",
    "Modern Physics",
];

const CHEMISTRY: &[&str] = &[
    "Some Basic Concepts of Chemistry",
    "Atomic Structure",
    "Chemical Bonding",
    "States of Matter",
    "Thermodynamics",
    "Equilibrium",
    "Redox Reactions",
    "s-Block Elements",
    "p-Block Elements",
    "d- and f- Block Elements",
    "Coordination Compounds",
    "Organic Chemistry Basics",
    "Hydrocarbons",
    "Haloalkanes and Haloarenes",
    "Alcohols Phenols Ethers",
    "Aldehydes Ketones Acids",
    "Amines",
    "Biomolecules",
    "Polymers",
    "Chemistry in Everyday Life",
];

const MATHS: &[&str] = &[
    "Sets Relations Functions",
    "Complex Numbers",
    "Quadratic Equations",
    "Sequences and Series",
    "Trigonometry",
    "Matrices Determinants",
    "Limits Continuity Differentiability",
    "Applications of Derivatives",
    "Integrals",
    "Differential Equations",
    "Vectors",
    "3D Geometry",
    "Probability",
    "Binomial Theorem",
    "Statistics",
];

pub fn topics(subject: Subject) -> &'static [&'static str] {
    match subject {
        Subject::Physics => PHYSICS,
        Subject::Chemistry => CHEMISTRY,
        Subject::Maths => MATHS,
    }
}

/// Topics for a raw subject name; unknown subjects have none.
pub fn topics_for_name(subject: &str) -> Vec<String> {
    Subject::parse(subject)
        .map(|subject| topics(subject).iter().map(|t| t.to_string()).collect())
        .unwrap_or_default()
}

pub fn contains_topic(subject: Subject, topic: &str) -> bool {
    topics(subject).contains(&topic)
}

/// Case-insensitive lookup returning the registry spelling.
pub fn canonical_topic(subject: Subject, topic: &str) -> Option<&'static str> {
    let topic = topic.trim();
    topics(subject)
        .iter()
        .copied()
        .find(|candidate| candidate.eq_ignore_ascii_case(topic))
}

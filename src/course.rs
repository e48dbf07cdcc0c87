#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitType {
    Assessment,
    UnitOfLessons,
    Link,
    Unrecognized(String),
}

impl UnitType {
    /// Course data files tag units with single letters ('A', 'U', 'O');
    /// newer payloads spell the type out. Anything else is carried as
    /// `Unrecognized` so rendering can degrade instead of aborting.
    pub fn from_tag(tag: &str) -> UnitType {
        match tag {
            "A" | "Assessment" => UnitType::Assessment,
            "U" | "Unit" | "UnitOfLessons" => UnitType::UnitOfLessons,
            "O" | "Link" => UnitType::Link,
            other => UnitType::Unrecognized(other.to_string()),
        }
    }

    pub fn as_tag(&self) -> &str {
        match self {
            UnitType::Assessment => "A",
            UnitType::UnitOfLessons => "U",
            UnitType::Link => "O",
            UnitType::Unrecognized(tag) => tag.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnitDescriptor {
    pub id: String,
    pub index: i64,
    pub title: String,
    pub unit_type: UnitType,
    pub now_available: bool,
    pub href: Option<String>,
    // Only meaningful for units of lessons; shown in place of a link when
    // the unit is not yet available.
    pub release_date: Option<String>,
}

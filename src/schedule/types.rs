use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A bookable slot-class within the weekly cycle.
///
/// The set is closed: every category known to the system is listed in [`Category::ALL`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    WedRegular,
    WedGuest,
    WedLeftover,
    WedLesson,
    FriRegular,
    FriGuest,
    FriLeftover,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::WedRegular,
        Category::WedGuest,
        Category::WedLeftover,
        Category::WedLesson,
        Category::FriRegular,
        Category::FriGuest,
        Category::FriLeftover,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::WedRegular => "WED_REGULAR",
            Category::WedGuest => "WED_GUEST",
            Category::WedLeftover => "WED_LEFTOVER",
            Category::WedLesson => "WED_LESSON",
            Category::FriRegular => "FRI_REGULAR",
            Category::FriGuest => "FRI_GUEST",
            Category::FriLeftover => "FRI_LEFTOVER",
        }
    }

    pub fn day(&self) -> Day {
        match self {
            Category::WedRegular
            | Category::WedGuest
            | Category::WedLeftover
            | Category::WedLesson => Day::Wed,
            Category::FriRegular | Category::FriGuest | Category::FriLeftover => Day::Fri,
        }
    }

    pub fn class(&self) -> CategoryClass {
        match self {
            Category::WedRegular | Category::FriRegular => CategoryClass::Regular,
            Category::WedGuest | Category::FriGuest => CategoryClass::Guest,
            Category::WedLeftover | Category::FriLeftover => CategoryClass::Leftover,
            Category::WedLesson => CategoryClass::Lesson,
        }
    }

    /// Whether releases in this category can produce vacancy notifications.
    pub fn is_capacity_tracked(&self) -> bool {
        self.class() != CategoryClass::Lesson
    }

    /// Human label used in push notification bodies.
    pub fn label(&self) -> &'static str {
        match self {
            Category::WedRegular => "Wednesday session",
            Category::WedGuest => "Wednesday guests",
            Category::WedLeftover => "Wednesday leftover seats",
            Category::WedLesson => "Wednesday lesson",
            Category::FriRegular => "Friday session",
            Category::FriGuest => "Friday guests",
            Category::FriLeftover => "Friday leftover seats",
        }
    }

    /// Categories belonging to the given day, in declaration order.
    pub fn for_day(day: Day) -> impl Iterator<Item = Category> {
        Self::ALL.into_iter().filter(move |c| c.day() == day)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

/// Admission phase of a category at a given instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    BeforeOpen,
    Open,
    CancelOnly,
    Closed,
}

impl Status {
    pub fn allows_claim(&self) -> bool {
        *self == Status::Open
    }

    pub fn allows_release(&self) -> bool {
        matches!(self, Status::Open | Status::CancelOnly)
    }
}

/// Behavioural class shared by the categories of both days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CategoryClass {
    Regular,
    Guest,
    Leftover,
    Lesson,
}

impl CategoryClass {
    /// Guest-class categories only hold entries made on behalf of a named guest.
    pub fn requires_guest(&self) -> bool {
        *self == CategoryClass::Guest
    }

    pub fn accepts_guest(&self) -> bool {
        matches!(self, CategoryClass::Guest | CategoryClass::Leftover)
    }
}

/// Session day a category (and its capacity) belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Wed,
    Fri,
}

impl Day {
    pub const ALL: [Day; 2] = [Day::Wed, Day::Fri];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Wed => "wed",
            Day::Fri => "fri",
        }
    }

    pub fn regular(&self) -> Category {
        match self {
            Day::Wed => Category::WedRegular,
            Day::Fri => Category::FriRegular,
        }
    }

    pub fn guest(&self) -> Category {
        match self {
            Day::Wed => Category::WedGuest,
            Day::Fri => Category::FriGuest,
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned student identifier. The client never mints or mutates one.
pub type StudentId = u64;

/// Gender as the backend stores it.
///
/// The backend spells the catch-all either "Agender" or "other" depending on
/// which form wrote the row, and bulk-imported seed data carries arbitrary
/// strings beyond that. Anything unrecognized decodes to `Other`; `Other`
/// always encodes as "Agender".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    pub fn parse(s: &str) -> Self {
        match s {
            "Male" => Gender::Male,
            "Female" => Gender::Female,
            _ => Gender::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Agender",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Gender::parse(&s))
    }
}

/// A student record as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub country: String,
    pub avatar: String,
    pub btc_address: String,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A student without its id: the form's local draft and the create body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: Gender,
    pub country: String,
    pub avatar: String,
    pub btc_address: String,
}

impl StudentDraft {
    /// Populate a draft from a fetched record (edit mode).
    pub fn from_student(student: &Student) -> Self {
        Self {
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            email: student.email.clone(),
            gender: student.gender,
            country: student.country.clone(),
            avatar: student.avatar.clone(),
            btc_address: student.btc_address.clone(),
        }
    }

    /// Rebuild the full record for an update call. PUT sends the whole row.
    pub fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            gender: self.gender,
            country: self.country,
            avatar: self.avatar,
            btc_address: self.btc_address,
        }
    }

    pub fn apply(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::FirstName(v) => self.first_name = v,
            FieldEdit::LastName(v) => self.last_name = v,
            FieldEdit::Email(v) => self.email = v,
            FieldEdit::Gender(v) => self.gender = v,
            FieldEdit::Country(v) => self.country = v,
            FieldEdit::Avatar(v) => self.avatar = v,
            FieldEdit::BtcAddress(v) => self.btc_address = v,
        }
    }
}

/// Field names as the backend (and its validation errors) spell them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudentField {
    FirstName,
    LastName,
    Email,
    Gender,
    Country,
    Avatar,
    BtcAddress,
}

impl StudentField {
    pub const ALL: [StudentField; 7] = [
        StudentField::FirstName,
        StudentField::LastName,
        StudentField::Email,
        StudentField::Gender,
        StudentField::Country,
        StudentField::Avatar,
        StudentField::BtcAddress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudentField::FirstName => "first_name",
            StudentField::LastName => "last_name",
            StudentField::Email => "email",
            StudentField::Gender => "gender",
            StudentField::Country => "country",
            StudentField::Avatar => "avatar",
            StudentField::BtcAddress => "btc_address",
        }
    }
}

impl fmt::Display for StudentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edit to one draft field. Replaces the original UI's string-keyed
/// property assignment with a tagged variant per field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    FirstName(String),
    LastName(String),
    Email(String),
    Gender(Gender),
    Country(String),
    Avatar(String),
    BtcAddress(String),
}

impl FieldEdit {
    /// Which field this edit touches.
    pub fn field(&self) -> StudentField {
        match self {
            FieldEdit::FirstName(_) => StudentField::FirstName,
            FieldEdit::LastName(_) => StudentField::LastName,
            FieldEdit::Email(_) => StudentField::Email,
            FieldEdit::Gender(_) => StudentField::Gender,
            FieldEdit::Country(_) => StudentField::Country,
            FieldEdit::Avatar(_) => StudentField::Avatar,
            FieldEdit::BtcAddress(_) => StudentField::BtcAddress,
        }
    }
}

/// One page of the student list plus the backend's total count.
///
/// The backend sends the total out-of-band in the `x-total-count` response
/// header; the API client folds it into this envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentPage {
    pub students: Vec<Student>,
    pub total: u64,
}

impl StudentPage {
    pub fn contains(&self, id: StudentId) -> bool {
        self.students.iter().any(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Pet models.

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Species {
    Canine,
    Feline,
    Exotic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Behavior {
    Docile,
    Friendly,
    Brave,
    Aggressive,
}

impl Species {
    pub fn as_str(&self) -> &'static str {
        match self {
            Species::Canine => "Canine",
            Species::Feline => "Feline",
            Species::Exotic => "Exotic",
        }
    }
}

impl std::str::FromStr for Species {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Canine" => Ok(Species::Canine),
            "Feline" => Ok(Species::Feline),
            "Exotic" => Ok(Species::Exotic),
            _ => Err(ParseEnumError::new("species", s)),
        }
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            _ => Err(ParseEnumError::new("gender", s)),
        }
    }
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Behavior::Docile => "Docile",
            Behavior::Friendly => "Friendly",
            Behavior::Brave => "Brave",
            Behavior::Aggressive => "Aggressive",
        }
    }
}

impl std::str::FromStr for Behavior {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Docile" => Ok(Behavior::Docile),
            "Friendly" => Ok(Behavior::Friendly),
            "Brave" => Ok(Behavior::Brave),
            "Aggressive" => Ok(Behavior::Aggressive),
            _ => Err(ParseEnumError::new("behavior", s)),
        }
    }
}

/// Contact details for an owner or foster home.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct OwnerInfo {
    pub name: String,
    pub address: String,
    /// Tax identification number
    pub nif: String,
    pub phone: String,
    pub email: String,
}

/// A registered pet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    /// Local UUID
    pub id: String,
    pub microchip: String,
    pub name: String,
    pub species: Species,
    pub breed: String,
    pub gender: Gender,
    pub color: String,
    pub is_sterilized: bool,
    pub behavior_with_animals: Behavior,
    pub behavior_with_people: Behavior,
    pub photo_url: String,
    /// ISO date (YYYY-MM-DD)
    pub birth_date: Option<String>,
    pub owner: Option<OwnerInfo>,
    pub foster: Option<OwnerInfo>,
    /// Temporary foster family ("FAT") placement
    pub is_fat: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Pet {
    /// Create a new pet with required fields and neutral defaults for the rest.
    pub fn new(name: String, species: Species, gender: Gender) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            microchip: String::new(),
            name,
            species,
            breed: String::new(),
            gender,
            color: String::new(),
            is_sterilized: false,
            behavior_with_animals: Behavior::Friendly,
            behavior_with_people: Behavior::Friendly,
            photo_url: String::new(),
            birth_date: None,
            owner: None,
            foster: None,
            is_fat: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Reference used to denormalize pet display fields into appointments.
    pub fn pet_ref(&self) -> super::PetRef {
        super::PetRef {
            id: self.id.clone(),
            name: self.name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pet() {
        let pet = Pet::new("Buddy".into(), Species::Canine, Gender::Male);
        assert_eq!(pet.name, "Buddy");
        assert_eq!(pet.id.len(), 36);
        assert!(pet.owner.is_none());

        let pet_ref = pet.pet_ref();
        assert_eq!(pet_ref.id, pet.id);
        assert_eq!(pet_ref.name, "Buddy");
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!("Feline".parse::<Species>().unwrap(), Species::Feline);
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("Brave".parse::<Behavior>().unwrap(), Behavior::Brave);
        assert!("Reptile".parse::<Species>().is_err());
    }
}

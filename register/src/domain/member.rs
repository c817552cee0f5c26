use serde::{Deserialize, Serialize};

use super::{non_blank, MemberId, ValidationError};

/// A registered member as stored in the `membre` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub nom: String,
    pub prenom: String,
    pub numero: Option<String>,
    #[serde(rename = "dateDeNaissance")]
    pub date_de_naissance: String,
}

impl Member {
    /// `"{nom} {prenom}"`, trimmed.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nom, self.prenom).trim().to_string()
    }
}

/// Fields supplied when registering or editing a member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInput {
    pub nom: String,
    pub prenom: String,
    pub numero: Option<String>,
    #[serde(rename = "dateDeNaissance", default)]
    pub date_de_naissance: String,
}

impl MemberInput {
    pub fn new(nom: impl Into<String>, prenom: impl Into<String>) -> Self {
        Self {
            nom: nom.into(),
            prenom: prenom.into(),
            ..Self::default()
        }
    }

    pub fn with_numero(mut self, numero: impl Into<String>) -> Self {
        self.numero = Some(numero.into());
        self
    }

    pub fn with_date_de_naissance(mut self, date: impl Into<String>) -> Self {
        self.date_de_naissance = date.into();
        self
    }

    /// Return a copy ready for storage.
    ///
    /// `nom` and `prenom` are trimmed and must not end up empty. A blank
    /// `numero` becomes `None` so it never collides with another member's
    /// empty phone under the UNIQUE constraint. The birth date is kept as
    /// entered.
    pub fn normalized(&self) -> Result<MemberInput, ValidationError> {
        let nom = non_blank(&self.nom).ok_or(ValidationError::EmptyNom)?;
        let prenom = non_blank(&self.prenom).ok_or(ValidationError::EmptyPrenom)?;
        let numero = self.numero.as_deref().and_then(non_blank).map(str::to_string);

        Ok(MemberInput {
            nom: nom.to_string(),
            prenom: prenom.to_string(),
            numero,
            date_de_naissance: self.date_de_naissance.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_trims_names_and_phone() {
        let input = MemberInput::new("  Dupont ", " Jean").with_numero(" 0600000000 ");
        let normalized = input.normalized().unwrap();
        assert_eq!(normalized.nom, "Dupont");
        assert_eq!(normalized.prenom, "Jean");
        assert_eq!(normalized.numero.as_deref(), Some("0600000000"));
    }

    #[test]
    fn birth_date_kept_as_entered() {
        let normalized = MemberInput::new("Dupont", "Jean")
            .with_date_de_naissance(" 01/02/1990 ")
            .normalized()
            .unwrap();
        assert_eq!(normalized.date_de_naissance, " 01/02/1990 ");
    }

    #[test]
    fn blank_numero_becomes_none() {
        let normalized = MemberInput::new("Dupont", "Jean")
            .with_numero("   ")
            .normalized()
            .unwrap();
        assert_eq!(normalized.numero, None);
    }

    #[test]
    fn empty_names_are_rejected() {
        assert_eq!(
            MemberInput::new("  ", "Jean").normalized(),
            Err(ValidationError::EmptyNom)
        );
        assert_eq!(
            MemberInput::new("Dupont", "").normalized(),
            Err(ValidationError::EmptyPrenom)
        );
    }

    #[test]
    fn serde_uses_camel_case_birth_date() {
        let member = Member {
            id: 3,
            nom: "Dupont".to_string(),
            prenom: "Jean".to_string(),
            numero: None,
            date_de_naissance: "1990-01-01".to_string(),
        };
        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["dateDeNaissance"], "1990-01-01");
        assert_eq!(member.full_name(), "Dupont Jean");
    }
}

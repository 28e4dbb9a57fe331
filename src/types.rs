use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants;

/// Response unit that filed an incident report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Advanced life support (SVA)
    Advanced,
    /// Basic life support (SVB)
    Basic,
    /// Anything else, including a blank cell
    Other,
}

impl UnitType {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_uppercase()) {
            Some(s) if s == constants::UNIT_ADVANCED => UnitType::Advanced,
            Some(s) if s == constants::UNIT_BASIC => UnitType::Basic,
            _ => UnitType::Other,
        }
    }
}

/// Free-text narrative columns, in the order they are scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NarrativeField {
    Consulta,
    Antecedentes,
    Tecnicas,
    Evolucion,
    Hospital,
    Hours6,
    Hours24,
    Days7,
}

impl NarrativeField {
    pub const ALL: [NarrativeField; 8] = [
        NarrativeField::Consulta,
        NarrativeField::Antecedentes,
        NarrativeField::Tecnicas,
        NarrativeField::Evolucion,
        NarrativeField::Hospital,
        NarrativeField::Hours6,
        NarrativeField::Hours24,
        NarrativeField::Days7,
    ];

    /// Fields written after the patient left the scene
    pub const FOLLOW_UP: [NarrativeField; 5] = [
        NarrativeField::Hours6,
        NarrativeField::Hours24,
        NarrativeField::Days7,
        NarrativeField::Evolucion,
        NarrativeField::Hospital,
    ];

    /// Raw export header for this field
    pub fn raw_column(&self) -> &'static str {
        match self {
            NarrativeField::Consulta => constants::RAW_CONSULTA,
            NarrativeField::Antecedentes => constants::RAW_ANTECEDENTES,
            NarrativeField::Tecnicas => constants::RAW_TECNICAS,
            NarrativeField::Evolucion => constants::RAW_EVOLUCION,
            NarrativeField::Hospital => constants::RAW_HOSPITAL,
            NarrativeField::Hours6 => constants::RAW_HOUR_6,
            NarrativeField::Hours24 => constants::RAW_HOUR_24,
            NarrativeField::Days7 => constants::RAW_DAY_7,
        }
    }

    /// Canonical snake_case name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            NarrativeField::Consulta => "consulta",
            NarrativeField::Antecedentes => "antecedentes",
            NarrativeField::Tecnicas => "tecnicas",
            NarrativeField::Evolucion => "evolucion",
            NarrativeField::Hospital => "hospital",
            NarrativeField::Hours6 => "6_horas",
            NarrativeField::Hours24 => "24_horas",
            NarrativeField::Days7 => "7_dias",
        }
    }
}

impl fmt::Display for NarrativeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eight narrative cells of an incident report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub consulta: Option<String>,
    pub antecedentes: Option<String>,
    pub tecnicas: Option<String>,
    pub evolucion: Option<String>,
    pub hospital: Option<String>,
    pub hours_6: Option<String>,
    pub hours_24: Option<String>,
    pub days_7: Option<String>,
}

impl Narrative {
    pub fn get(&self, field: NarrativeField) -> Option<&str> {
        match field {
            NarrativeField::Consulta => self.consulta.as_deref(),
            NarrativeField::Antecedentes => self.antecedentes.as_deref(),
            NarrativeField::Tecnicas => self.tecnicas.as_deref(),
            NarrativeField::Evolucion => self.evolucion.as_deref(),
            NarrativeField::Hospital => self.hospital.as_deref(),
            NarrativeField::Hours6 => self.hours_6.as_deref(),
            NarrativeField::Hours24 => self.hours_24.as_deref(),
            NarrativeField::Days7 => self.days_7.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, field: NarrativeField) -> &mut Option<String> {
        match field {
            NarrativeField::Consulta => &mut self.consulta,
            NarrativeField::Antecedentes => &mut self.antecedentes,
            NarrativeField::Tecnicas => &mut self.tecnicas,
            NarrativeField::Evolucion => &mut self.evolucion,
            NarrativeField::Hospital => &mut self.hospital,
            NarrativeField::Hours6 => &mut self.hours_6,
            NarrativeField::Hours24 => &mut self.hours_24,
            NarrativeField::Days7 => &mut self.days_7,
        }
    }

    pub fn backfill_from(&mut self, other: &Narrative) {
        for field in NarrativeField::ALL {
            let slot = self.slot_mut(field);
            if slot.is_none() {
                *slot = other.get(field).map(str::to_string);
            }
        }
    }
}

/// One row of the registry export, before any interpretation.
///
/// Every cell is optional: blank cells and spreadsheet placeholders such as
/// `nan` are loaded as `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawIncident {
    /// 1-based data row in the source file
    pub row: usize,
    pub id: Option<String>,
    pub call_date: Option<String>,
    pub age: Option<String>,
    pub sex: Option<String>,
    pub telephone_cpr: Option<String>,
    pub aed: Option<String>,
    pub bystander_cpr: Option<String>,
    pub c0_c1: Option<String>,
    pub c1_c2: Option<String>,
    pub c2_c3: Option<String>,
    pub c3_c4: Option<String>,
    pub rhythm: Option<String>,
    pub rosc: Option<String>,
    pub cpc: Option<String>,
    pub unit_type: Option<String>,
    pub narrative: Narrative,
}

fn fill(slot: &mut Option<String>, other: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(other);
    }
}

impl RawIncident {
    pub fn unit(&self) -> UnitType {
        UnitType::parse(self.unit_type.as_deref())
    }

    /// Identifier used in reports; falls back to the source row
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("row {}", self.row),
        }
    }

    /// Copy every cell that is missing here from `other`.
    /// Identifier, unit type and row stay untouched.
    pub fn backfill_from(&mut self, other: &RawIncident) {
        fill(&mut self.call_date, &other.call_date);
        fill(&mut self.age, &other.age);
        fill(&mut self.sex, &other.sex);
        fill(&mut self.telephone_cpr, &other.telephone_cpr);
        fill(&mut self.aed, &other.aed);
        fill(&mut self.bystander_cpr, &other.bystander_cpr);
        fill(&mut self.c0_c1, &other.c0_c1);
        fill(&mut self.c1_c2, &other.c1_c2);
        fill(&mut self.c2_c3, &other.c2_c3);
        fill(&mut self.c3_c4, &other.c3_c4);
        fill(&mut self.rhythm, &other.rhythm);
        fill(&mut self.rosc, &other.rosc);
        fill(&mut self.cpc, &other.cpc);
        self.narrative.backfill_from(&other.narrative);
    }
}

/// Who started resuscitation before the ambulance arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Responder {
    Bystander,
    Police,
    Firefighter,
    Medical,
}

impl Responder {
    pub const ALL: [Responder; 4] = [
        Responder::Bystander,
        Responder::Police,
        Responder::Firefighter,
        Responder::Medical,
    ];

    /// Label written to the `respondiente_rcp` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Responder::Bystander => "lego",
            Responder::Police => "policia",
            Responder::Firefighter => "bombero",
            Responder::Medical => "sanitario",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Responder::ALL
            .into_iter()
            .find(|r| r.as_str() == label.trim().to_lowercase())
    }
}

impl fmt::Display for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

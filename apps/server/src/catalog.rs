use serde::Serialize;

use crate::booking::{FlowKind, PaymentMethodDescriptor, ServiceDescriptor, VisitType};

// ── Listing types ──

#[derive(Debug, Serialize)]
pub struct Doctor {
    pub id: &'static str,
    pub name: &'static str,
    pub specialty: &'static str,
    pub hospital: &'static str,
    pub location: &'static str,
    pub experience_years: u32,
    pub rating: f32,
    pub consultation_fee: i64,
    pub languages: &'static [&'static str],
    pub visit_types: &'static [VisitType],
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct Nanny {
    pub id: &'static str,
    pub name: &'static str,
    pub location: &'static str,
    pub experience_years: u32,
    pub rating: f32,
    pub daily_rate: i64,
    pub age_groups: &'static str,
    pub skills: &'static [&'static str],
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct Nurse {
    pub id: &'static str,
    pub name: &'static str,
    pub specialization: &'static str,
    pub location: &'static str,
    pub experience_years: u32,
    pub rating: f32,
    pub visit_fee: i64,
    pub available: bool,
}

#[derive(Debug, Serialize)]
pub struct EmergencyService {
    pub id: &'static str,
    pub name: &'static str,
    pub service_type: &'static str,
    pub location: &'static str,
    pub response_time_min: u32,
    pub rating: f32,
    pub base_fee: i64,
    pub open_24x7: bool,
    pub available: bool,
}

/// Any bookable listing. Cheap to copy: it points into static data.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "listing_type", content = "listing", rename_all = "snake_case")]
pub enum Listing {
    Doctor(&'static Doctor),
    Nanny(&'static Nanny),
    Nurse(&'static Nurse),
    EmergencyService(&'static EmergencyService),
}

impl Listing {
    pub fn name(&self) -> &'static str {
        match self {
            Listing::Doctor(d) => d.name,
            Listing::Nanny(n) => n.name,
            Listing::Nurse(n) => n.name,
            Listing::EmergencyService(e) => e.name,
        }
    }

    /// Specialty, specialization or service category, depending on the listing.
    pub fn specialty(&self) -> &'static str {
        match self {
            Listing::Doctor(d) => d.specialty,
            Listing::Nanny(n) => n.age_groups,
            Listing::Nurse(n) => n.specialization,
            Listing::EmergencyService(e) => e.service_type,
        }
    }

    pub fn tags(&self) -> &'static [&'static str] {
        match self {
            Listing::Doctor(d) => d.languages,
            Listing::Nanny(n) => n.skills,
            Listing::Nurse(_) | Listing::EmergencyService(_) => &[],
        }
    }

    pub fn location(&self) -> &'static str {
        match self {
            Listing::Doctor(d) => d.location,
            Listing::Nanny(n) => n.location,
            Listing::Nurse(n) => n.location,
            Listing::EmergencyService(e) => e.location,
        }
    }

    pub fn rating(&self) -> f32 {
        match self {
            Listing::Doctor(d) => d.rating,
            Listing::Nanny(n) => n.rating,
            Listing::Nurse(n) => n.rating,
            Listing::EmergencyService(e) => e.rating,
        }
    }

    /// How the service can be delivered.
    pub fn visit_types(&self) -> &'static [VisitType] {
        match self {
            Listing::Doctor(d) => d.visit_types,
            Listing::Nanny(_) => &[VisitType::HomeVisit, VisitType::InPerson],
            Listing::Nurse(_) => &[VisitType::HomeVisit],
            Listing::EmergencyService(_) => &[VisitType::InPerson],
        }
    }

    pub fn available(&self) -> bool {
        match self {
            Listing::Doctor(d) => d.available,
            Listing::Nanny(n) => n.available,
            Listing::Nurse(n) => n.available,
            Listing::EmergencyService(e) => e.available,
        }
    }
}

impl ServiceDescriptor for Listing {
    fn id(&self) -> &str {
        match self {
            Listing::Doctor(d) => d.id,
            Listing::Nanny(n) => n.id,
            Listing::Nurse(n) => n.id,
            Listing::EmergencyService(e) => e.id,
        }
    }

    fn display_name(&self) -> &str {
        self.name()
    }

    fn base_fee(&self) -> i64 {
        match self {
            Listing::Doctor(d) => d.consultation_fee,
            Listing::Nanny(n) => n.daily_rate,
            Listing::Nurse(n) => n.visit_fee,
            Listing::EmergencyService(e) => e.base_fee,
        }
    }
}

// ── Mock data ──

static DOCTORS: [Doctor; 4] = [
    Doctor {
        id: "doc-1",
        name: "Dr. Meera Rao",
        specialty: "Cardiology",
        hospital: "Apollo Hospital",
        location: "Bengaluru",
        experience_years: 15,
        rating: 4.8,
        consultation_fee: 2500,
        languages: &["English", "Hindi", "Kannada"],
        visit_types: &[VisitType::Video, VisitType::InPerson],
        available: true,
    },
    Doctor {
        id: "doc-2",
        name: "Dr. Arjun Mehta",
        specialty: "Dermatology",
        hospital: "Fortis Hospital",
        location: "Mumbai",
        experience_years: 9,
        rating: 4.6,
        consultation_fee: 1200,
        languages: &["English", "Hindi", "Marathi"],
        visit_types: &[VisitType::Video],
        available: true,
    },
    Doctor {
        id: "doc-3",
        name: "Dr. Sana Qureshi",
        specialty: "Pediatrics",
        hospital: "Rainbow Children's Hospital",
        location: "Hyderabad",
        experience_years: 12,
        rating: 4.9,
        consultation_fee: 900,
        languages: &["English", "Urdu", "Telugu"],
        visit_types: &[VisitType::Video, VisitType::InPerson],
        available: true,
    },
    Doctor {
        id: "doc-4",
        name: "Dr. Vikram Singh",
        specialty: "Orthopedics",
        hospital: "Max Healthcare",
        location: "New Delhi",
        experience_years: 20,
        rating: 4.7,
        consultation_fee: 1800,
        languages: &["English", "Hindi", "Punjabi"],
        visit_types: &[VisitType::InPerson],
        available: false,
    },
];

static NANNIES: [Nanny; 3] = [
    Nanny {
        id: "nanny-1",
        name: "Priya Sharma",
        location: "Bengaluru",
        experience_years: 6,
        rating: 4.8,
        daily_rate: 800,
        age_groups: "Infants and toddlers",
        skills: &["Infant care", "First aid", "Cooking"],
        available: true,
    },
    Nanny {
        id: "nanny-2",
        name: "Lakshmi Iyer",
        location: "Chennai",
        experience_years: 10,
        rating: 4.9,
        daily_rate: 1000,
        age_groups: "School age",
        skills: &["Special needs", "Homework help"],
        available: true,
    },
    Nanny {
        id: "nanny-3",
        name: "Anita Das",
        location: "Kolkata",
        experience_years: 3,
        rating: 4.4,
        daily_rate: 600,
        age_groups: "Toddlers",
        skills: &["Storytelling", "First aid"],
        available: false,
    },
];

static NURSES: [Nurse; 3] = [
    Nurse {
        id: "nurse-1",
        name: "Rekha Nair",
        specialization: "ICU Care",
        location: "Kochi",
        experience_years: 8,
        rating: 4.7,
        visit_fee: 1500,
        available: true,
    },
    Nurse {
        id: "nurse-2",
        name: "Joseph Thomas",
        specialization: "Elderly Care",
        location: "Bengaluru",
        experience_years: 11,
        rating: 4.8,
        visit_fee: 1300,
        available: true,
    },
    Nurse {
        id: "nurse-3",
        name: "Fatima Khan",
        specialization: "Post-operative Care",
        location: "Mumbai",
        experience_years: 5,
        rating: 4.5,
        visit_fee: 1100,
        available: true,
    },
];

static EMERGENCY_SERVICES: [EmergencyService; 3] = [
    EmergencyService {
        id: "ems-1",
        name: "LifeLine Ambulance",
        service_type: "Advanced Life Support",
        location: "Bengaluru",
        response_time_min: 8,
        rating: 4.8,
        base_fee: 2000,
        open_24x7: true,
        available: true,
    },
    EmergencyService {
        id: "ems-2",
        name: "RapidCare Ambulance",
        service_type: "Basic Life Support",
        location: "Mumbai",
        response_time_min: 12,
        rating: 4.5,
        base_fee: 1500,
        open_24x7: true,
        available: true,
    },
    EmergencyService {
        id: "ems-3",
        name: "MedAir Rescue",
        service_type: "Air Ambulance",
        location: "New Delhi",
        response_time_min: 45,
        rating: 4.9,
        base_fee: 150000,
        open_24x7: false,
        available: true,
    },
];

static PAYMENT_METHODS: [PaymentMethodDescriptor; 5] = [
    PaymentMethodDescriptor {
        id: "upi",
        name: "UPI",
        description: "Pay instantly from any UPI app",
        discount_percent: None,
        available: true,
    },
    PaymentMethodDescriptor {
        id: "card",
        name: "Credit / Debit Card",
        description: "Visa, Mastercard, RuPay",
        discount_percent: None,
        available: true,
    },
    PaymentMethodDescriptor {
        id: "wallet",
        name: "CareFlow Wallet",
        description: "5% off with wallet balance",
        discount_percent: Some(5),
        available: true,
    },
    PaymentMethodDescriptor {
        id: "insurance",
        name: "Health Insurance",
        description: "Your plan covers 80% of the bill",
        discount_percent: Some(80),
        available: true,
    },
    PaymentMethodDescriptor {
        id: "emi",
        name: "EMI",
        description: "Coming soon",
        discount_percent: None,
        available: false,
    },
];

// ── Lookups ──

pub fn listings(kind: FlowKind) -> Vec<Listing> {
    match kind {
        FlowKind::DoctorConsultation => DOCTORS.iter().map(Listing::Doctor).collect(),
        FlowKind::Childcare => NANNIES.iter().map(Listing::Nanny).collect(),
        FlowKind::NurseVisit => NURSES.iter().map(Listing::Nurse).collect(),
        FlowKind::Emergency => EMERGENCY_SERVICES
            .iter()
            .map(Listing::EmergencyService)
            .collect(),
    }
}

pub fn find_listing(kind: FlowKind, id: &str) -> Option<Listing> {
    listings(kind).into_iter().find(|l| l.id() == id)
}

pub fn payment_methods() -> &'static [PaymentMethodDescriptor] {
    &PAYMENT_METHODS
}

pub fn find_payment_method(id: &str) -> Option<&'static PaymentMethodDescriptor> {
    PAYMENT_METHODS.iter().find(|m| m.id == id)
}

// ── Tests ──

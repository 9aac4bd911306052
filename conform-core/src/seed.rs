//! Demonstration dataset.
//!
//! Loaded by [`crate::repository::InMemoryRepository::seeded`] and by
//! [`crate::db::SqliteRepository::seed_if_empty`] so a fresh database opens onto a reviewable
//! run. Unit tests across the crate rely on the exact ordering and values here.

use crate::types::{
    ConformanceResult, ConformanceRun, Evidence, EvidenceStatus, MaterialIndexVersion,
    OverallStatus, Project, ProjectStatus, RunStatus, User, UserRole, UserStatus,
};

/// Id of the run that carries [`demo_results`].
pub const DEMO_RUN_ID: &str = "run-1";

fn user(
    id: &str,
    first: &str,
    last: &str,
    role: UserRole,
    status: UserStatus,
    projects: &[&str],
) -> User {
    User {
        id: id.to_owned(),
        email: format!("{}.{}@acco.com", first.to_lowercase(), last.to_lowercase()),
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        role,
        status,
        assigned_projects: projects.iter().map(|p| p.to_string()).collect(),
    }
}

pub fn demo_users() -> Vec<User> {
    use UserRole::{Admin, User as Member};
    use UserStatus::{Active, Pending};
    vec![
        user("user-1", "John", "Martinez", Admin, Active, &["proj-1", "proj-2", "proj-3"]),
        user("user-2", "Sarah", "Chen", Member, Active, &["proj-1", "proj-2"]),
        user("user-3", "Mike", "Johnson", Member, Active, &["proj-2", "proj-3"]),
        user("user-4", "Emily", "Davis", Member, Pending, &[]),
        user("user-5", "Robert", "Wilson", Admin, Active, &["proj-1", "proj-3"]),
    ]
}

fn evidence(status: EvidenceStatus, chunks: &[&str], pages: &[u32], explanation: &str) -> Vec<Evidence> {
    vec![Evidence {
        status,
        chunks: chunks.iter().map(|c| c.to_string()).collect(),
        page_references: pages.to_vec(),
        explanation: explanation.to_owned(),
    }]
}

struct Item<'a> {
    id: &'a str,
    description: &'a str,
    section: &'a str,
    division: &'a str,
    system: &'a str,
    status: OverallStatus,
    score: u8,
    spec: Vec<Evidence>,
    material: Vec<Evidence>,
}

impl Item<'_> {
    fn build(self) -> ConformanceResult {
        ConformanceResult {
            id: self.id.to_owned(),
            material_description: self.description.to_owned(),
            spec_section: self.section.to_owned(),
            division: self.division.to_owned(),
            system_type: self.system.to_owned(),
            overall_status: self.status,
            confidence_score: self.score,
            project_spec_evidence: self.spec,
            material_index_evidence: self.material,
            discrepancy: None,
            review_assignment: None,
            review_history: Vec::new(),
        }
    }
}

const HVAC: &str = "Division 23 - HVAC";
const FIRE: &str = "Division 21 - Fire Suppression";

/// The ten analysed items of [`DEMO_RUN_ID`], in report order.
pub fn demo_results() -> Vec<ConformanceResult> {
    use EvidenceStatus::{Discrepancy, Match, PotentialIssue};
    use OverallStatus::{ActionMandatory, PreApproved, ReviewRequired};

    let items = [
        Item {
            id: "result-1",
            description: "Centrifugal Chiller, Water-Cooled, 500 Ton Capacity, Variable Speed Drive",
            section: "23 64 16",
            division: HVAC,
            system: "Chilled Water System",
            status: PreApproved,
            score: 98,
            spec: evidence(
                Match,
                &[
                    "Water-cooled centrifugal chillers shall have a minimum capacity of 500 tons at ARI 550/590 conditions.",
                    "Chillers shall be equipped with variable speed drives for capacity modulation and energy efficiency.",
                ],
                &[234, 235],
                "The submitted chiller meets all specification requirements for capacity, cooling type, and VSD equipment.",
            ),
            material: evidence(
                Match,
                &["Trane CenTraVac CVHF Series - 500 Ton - Approved baseline equipment"],
                &[45],
                "This chiller model is listed in the approved Material Index as baseline equipment.",
            ),
        },
        Item {
            id: "result-2",
            description: "VAV Box with Hot Water Reheat, 2000 CFM, DDC Controls",
            section: "23 36 00",
            division: HVAC,
            system: "Air Distribution",
            status: PreApproved,
            score: 95,
            spec: evidence(
                Match,
                &[
                    "VAV terminal units shall be pressure-independent type with DDC controls.",
                    "Units serving perimeter zones shall include hot water reheat coils.",
                ],
                &[187, 188],
                "VAV box specifications align with project requirements for airflow, controls, and reheat capability.",
            ),
            material: evidence(
                Match,
                &["Titus VAV Units with Reheat - Approved"],
                &[32],
                "Product is in the approved materials list.",
            ),
        },
        Item {
            id: "result-3",
            description: "Fire Sprinkler Head, Pendant, Standard Response, 155°F, K-Factor 5.6",
            section: "21 13 13",
            division: FIRE,
            system: "Wet Pipe Sprinkler",
            status: ReviewRequired,
            score: 72,
            spec: evidence(
                PotentialIssue,
                &[
                    "Sprinkler heads in areas with high ceilings exceeding 20 feet shall be quick-response type.",
                    "All sprinkler heads shall have a minimum K-factor of 5.6.",
                ],
                &[156, 157],
                "The submitted standard response sprinkler heads may not meet requirements for high-ceiling areas. Verify ceiling heights in installation locations.",
            ),
            material: evidence(
                Match,
                &["Viking VK302 Pendant Sprinkler - Standard Response - Approved for standard ceiling heights"],
                &[18],
                "Product is approved but with ceiling height restrictions.",
            ),
        },
        Item {
            id: "result-4",
            description: "Copper Pipe, Type L, 4\" Diameter, for Chilled Water",
            section: "23 21 13",
            division: HVAC,
            system: "Hydronic Piping",
            status: PreApproved,
            score: 99,
            spec: evidence(
                Match,
                &["Copper piping for chilled water systems 2-1/2 inches and larger shall be Type L."],
                &[201],
                "Type L copper pipe meets specification requirements for chilled water piping.",
            ),
            material: evidence(
                Match,
                &["Mueller Copper Tube Type L - Approved for all hydronic applications"],
                &[28],
                "Standard approved material.",
            ),
        },
        Item {
            id: "result-5",
            description: "Ductwork Insulation, Fiberglass, 2\" Thick, R-8",
            section: "23 07 13",
            division: HVAC,
            system: "HVAC Insulation",
            status: ActionMandatory,
            score: 45,
            spec: evidence(
                Discrepancy,
                &[
                    "Ductwork insulation for supply air ducts shall have a minimum R-value of R-12.",
                    "Insulation thickness shall be minimum 3 inches for all supply ductwork.",
                ],
                &[178, 179],
                "The submitted R-8, 2\" insulation does NOT meet the specification requirement of R-12 minimum with 3\" thickness.",
            ),
            material: evidence(
                Discrepancy,
                &["Owens Corning 703 - R-8 - NOT approved for supply duct applications requiring R-12+"],
                &[35],
                "Material Index explicitly excludes this product for high-R-value applications.",
            ),
        },
        Item {
            id: "result-6",
            description: "Air Handling Unit, 15,000 CFM, DX Cooling, Gas Heat",
            section: "23 73 13",
            division: HVAC,
            system: "Air Handling",
            status: ReviewRequired,
            score: 68,
            spec: evidence(
                PotentialIssue,
                &[
                    "Air handling units shall be factory-assembled, draw-through configuration.",
                    "Units shall include energy recovery wheels with minimum 70% effectiveness.",
                ],
                &[220, 221],
                "Submittal does not indicate energy recovery wheel. Verify if unit includes ERV or if waiver is needed.",
            ),
            material: evidence(
                Match,
                &["Carrier 39M Series AHU - Approved with energy recovery options"],
                &[42],
                "Base unit is approved; energy recovery configuration needs verification.",
            ),
        },
        Item {
            id: "result-7",
            description: "Building Automation System Controller, DDC, BACnet MS/TP",
            section: "23 09 23",
            division: HVAC,
            system: "Controls",
            status: PreApproved,
            score: 94,
            spec: evidence(
                Match,
                &[
                    "All DDC controllers shall communicate via BACnet MS/TP protocol.",
                    "Controllers shall be BTL listed.",
                ],
                &[245],
                "Controller meets BACnet and BTL listing requirements.",
            ),
            material: evidence(
                Match,
                &["Johnson Controls FX-PC Series - BACnet MS/TP - BTL Listed - Approved"],
                &[51],
                "Product is on approved list.",
            ),
        },
        Item {
            id: "result-8",
            description: "Fire Pump, Electric Motor Driven, 1500 GPM, 125 PSI",
            section: "21 31 13",
            division: FIRE,
            system: "Fire Pump",
            status: PreApproved,
            score: 91,
            spec: evidence(
                Match,
                &[
                    "Fire pump shall be horizontal split-case type with minimum 1500 GPM capacity at 125 PSI.",
                    "Motor shall be electric, suitable for 480V/3Ph/60Hz power supply.",
                ],
                &[162, 163],
                "Fire pump meets all capacity, pressure, and electrical requirements.",
            ),
            material: evidence(
                Match,
                &["Aurora Pump 411 Series - Fire Pump - UL/FM Listed - Approved"],
                &[22],
                "Listed in approved materials.",
            ),
        },
        Item {
            id: "result-9",
            description: "Exhaust Fan, Centrifugal, Belt-Drive, 5000 CFM",
            section: "23 34 16",
            division: HVAC,
            system: "Exhaust Systems",
            status: ReviewRequired,
            score: 75,
            spec: evidence(
                PotentialIssue,
                &[
                    "Exhaust fans for kitchen applications shall be listed for grease-laden air service.",
                    "Fan motors shall be located outside the airstream.",
                ],
                &[195],
                "Submittal does not specify if fan is rated for grease-laden air. Confirm application and fan rating.",
            ),
            material: evidence(
                Match,
                &["Greenheck CUBE Series - General exhaust applications - Approved"],
                &[38],
                "Fan is approved for general exhaust; grease rating verification needed.",
            ),
        },
        Item {
            id: "result-10",
            description: "Refrigerant Piping, ACR Copper, 1-1/8\" OD",
            section: "23 23 00",
            division: HVAC,
            system: "Refrigerant Piping",
            status: PreApproved,
            score: 97,
            spec: evidence(
                Match,
                &["Refrigerant piping shall be ACR copper tubing, cleaned, dehydrated, and sealed."],
                &[208],
                "ACR copper meets specification for refrigerant piping.",
            ),
            material: evidence(
                Match,
                &["Mueller Streamline ACR Copper - Approved for all refrigerant applications"],
                &[30],
                "Standard approved material.",
            ),
        },
    ];
    items.into_iter().map(Item::build).collect()
}

pub fn demo_run() -> ConformanceRun {
    ConformanceRun {
        id: DEMO_RUN_ID.to_owned(),
        project_id: "proj-1".to_owned(),
        version: 1,
        status: RunStatus::ReadyForReview,
        material_index_version: "v2.1".to_owned(),
        created_by: "user-2".to_owned(),
        created_at: 1_706_265_000,
    }
}

/// Every run, including the still-processing run with no results yet.
pub fn demo_runs() -> Vec<ConformanceRun> {
    vec![
        demo_run(),
        ConformanceRun {
            id: "run-2".to_owned(),
            project_id: "proj-2".to_owned(),
            version: 1,
            status: RunStatus::Processing,
            material_index_version: "v2.1".to_owned(),
            created_by: "user-3".to_owned(),
            created_at: 1_706_428_800,
        },
    ]
}

fn project(
    id: &str,
    name: &str,
    job_id: &str,
    location: &str,
    status: ProjectStatus,
    created_by: &str,
    created_at: i64,
) -> Project {
    Project {
        id: id.to_owned(),
        name: name.to_owned(),
        job_id: job_id.to_owned(),
        location: location.to_owned(),
        status,
        created_by: created_by.to_owned(),
        created_at,
    }
}

pub fn demo_projects() -> Vec<Project> {
    use ProjectStatus::{Active, Completed, OnHold, Planning};
    vec![
        project("proj-1", "Downtown Medical Center HVAC Renovation", "DMC-2024-001", "Los Angeles, CA", Active, "user-1", 1_704_844_800),
        project("proj-2", "Tech Campus Building B Fire Suppression", "TCB-2024-015", "San Jose, CA", Active, "user-1", 1_705_276_800),
        project("proj-3", "Airport Terminal Expansion HVAC", "ATE-2024-042", "Phoenix, AZ", Planning, "user-5", 1_705_708_800),
        project("proj-4", "Hotel Resort Chiller Plant", "HRC-2023-089", "San Diego, CA", Completed, "user-1", 1_699_142_400),
        project("proj-5", "University Science Building Renovation", "USB-2024-003", "Berkeley, CA", OnHold, "user-1", 1_704_672_000),
    ]
}

pub fn demo_material_indexes() -> Vec<MaterialIndexVersion> {
    let version = |id: &str, number: &str, name: &str, active: bool, by: &str, at: i64, items: u32| {
        MaterialIndexVersion {
            id: id.to_owned(),
            version_number: number.to_owned(),
            name: name.to_owned(),
            is_active: active,
            uploaded_by: by.to_owned(),
            uploaded_at: at,
            item_count: items,
        }
    };
    vec![
        version("mi-1", "v2.1", "Q1 2024 Material Standards", true, "John Martinez", 1_704_412_800, 1247),
        version("mi-2", "v2.0", "Q4 2023 Material Standards", false, "Robert Wilson", 1_696_204_800, 1189),
        version("mi-3", "v1.9", "Q3 2023 Material Standards", false, "John Martinez", 1_688_169_600, 1102),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_active_material_index() {
        let active: Vec<_> = demo_material_indexes().into_iter().filter(|m| m.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].version_number, demo_run().material_index_version);
    }

    #[test]
    fn result_ids_are_unique_and_ordered() {
        let ids: Vec<String> = demo_results().into_iter().map(|r| r.id).collect();
        let expected: Vec<String> = (1..=10).map(|i| format!("result-{i}")).collect();
        assert_eq!(ids, expected);
    }
}

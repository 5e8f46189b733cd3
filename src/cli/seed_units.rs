use crate::app_data::AppData;
use crate::errors::InternalError;
use crate::stores::UnitFields;
use crate::types::db::{Role, UnitType};

/// code, name, type, role, parent code, description
type SeedUnit = (&'static str, &'static str, UnitType, Role, Option<&'static str>, &'static str);

/// Default faculty hierarchy; parents precede their children
const DEFAULT_UNITS: &[SeedUnit] = &[
    ("DEKAN", "Dekan", UnitType::Unit, Role::Dekan, None, "Dekan Fakultas"),
    ("WADEK_1", "Wakil Dekan I", UnitType::WadekOne, Role::Wadek, Some("DEKAN"), "Wakil Dekan Bidang Akademik"),
    ("WADEK_2", "Wakil Dekan II", UnitType::WadekTwo, Role::Wadek, Some("DEKAN"), "Wakil Dekan Bidang Non-Akademik"),
    ("BAKORDIK", "Badan Koordinasi Pendidikan", UnitType::Unit, Role::Unit, Some("WADEK_1"), "Badan Koordinasi Pendidikan"),
    ("KA_PRODI_PPDS", "Unit PPDS", UnitType::Unit, Role::Unit, Some("BAKORDIK"), "Kepala Program Studi PPDS"),
    ("KA_PRODI_PSPD", "Unit PSPD", UnitType::Unit, Role::Unit, Some("BAKORDIK"), "Kepala Program Studi PSPD"),
    ("KA_PRODI_GIZI", "Ka. Prodi Gizi", UnitType::Unit, Role::Unit, Some("WADEK_1"), "Kepala Program Studi Gizi"),
    ("KABAG_TU", "Kabag. TU", UnitType::Unit, Role::Unit, Some("WADEK_1"), "Kepala Bagian Tata Usaha"),
    ("KOORD_DEPT_PREKLINIK", "Koord Dept Preklinik", UnitType::Unit, Role::Unit, Some("WADEK_2"), "Koordinator Departemen Preklinik"),
    ("KOORD_DEPT_KLINIK", "Koord Dept Klinik", UnitType::Unit, Role::Unit, Some("WADEK_2"), "Koordinator Departemen Klinik"),
    ("UNIT_TI", "Unit Pelaksana Teknologi Informasi", UnitType::Unit, Role::Unit, Some("WADEK_2"), "Unit Pelaksana Teknologi Informasi"),
    ("UPKK", "Unit Pendidikan Kedokteran Kesehatan", UnitType::Unit, Role::Unit, Some("WADEK_2"), "Unit Pendidikan Kedokteran Kesehatan"),
    ("BADAN_PENJAMINAN_MUTU", "Badan Penjaminan Mutu", UnitType::Unit, Role::Unit, Some("WADEK_2"), "Badan Penjaminan Mutu"),
    ("SDM", "Sumber Daya Manusia", UnitType::Sdm, Role::Sdm, Some("WADEK_2"), "Staf dan tenaga kependidikan"),
];

/// Insert missing default units; returns how many were created
pub async fn seed_units(app_data: &AppData) -> Result<usize, InternalError> {
    let store = &app_data.unit_store;
    let mut created = 0;

    for (code, name, unit_type, role, parent_code, description) in DEFAULT_UNITS.iter().copied() {
        if store.find_by_code(&app_data.db, code).await?.is_some() {
            tracing::debug!("Unit {} already present, skipping", code);
            continue;
        }

        let parent_unit_id = match parent_code {
            Some(parent_code) => store
                .find_by_code(&app_data.db, parent_code)
                .await?
                .map(|parent| parent.id),
            None => None,
        };

        store
            .insert(
                &app_data.db,
                UnitFields {
                    code: code.to_string(),
                    name: name.to_string(),
                    unit_type,
                    parent_unit_id,
                    role,
                    description: Some(description.to_string()),
                    position_x: None,
                    position_y: None,
                    is_active: true,
                },
            )
            .await?;
        created += 1;
    }

    tracing::info!("Unit seeding finished, {} unit(s) created", created);
    Ok(created)
}

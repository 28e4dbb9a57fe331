/// Column and file name constants shared across the pipeline.
/// Raw names are the registry export headers (case-sensitive), canonical names
/// are the snake_case names used in every output.

// Raw export headers
pub const RAW_ID: &str = "NUM INFORME";
pub const RAW_CALL_DATE: &str = "FECHA_LLAMADA";
pub const RAW_AGE: &str = "EDAD";
pub const RAW_SEX: &str = "SEXO";
pub const RAW_TELEPHONE_CPR: &str = "RCP_TRANSTELEFONICA";
pub const RAW_AED: &str = "DESA_EXTERNO";
pub const RAW_BYSTANDER_CPR: &str = "RCP_TESTIGOS";
pub const RAW_C0_C1: &str = "C0_C1";
pub const RAW_C1_C2: &str = "C1_C2";
pub const RAW_C2_C3: &str = "C2_C3";
pub const RAW_C3_C4: &str = "C3_C4";
pub const RAW_RHYTHM: &str = "RITMO INICIAL";
pub const RAW_ROSC: &str = "ROSC";
pub const RAW_DAY_7: &str = "7 DIAS";
pub const RAW_CPC: &str = "CPC";
pub const RAW_UNIT_TYPE: &str = "Tipo de Unidad";
pub const RAW_CONSULTA: &str = "CONSULTA";
pub const RAW_ANTECEDENTES: &str = "ANTECEDENTES";
pub const RAW_TECNICAS: &str = "TECNICAS";
pub const RAW_EVOLUCION: &str = "EVOLUCION";
pub const RAW_HOSPITAL: &str = "HOSPITAL";
pub const RAW_HOUR_6: &str = "6 HORAS";
pub const RAW_HOUR_24: &str = "24 HORAS";

/// Every header the loader requires, in export order.
pub const REQUIRED_RAW_COLUMNS: [&str; 23] = [
    RAW_ID,
    RAW_CALL_DATE,
    RAW_AGE,
    RAW_SEX,
    RAW_TELEPHONE_CPR,
    RAW_AED,
    RAW_BYSTANDER_CPR,
    RAW_C0_C1,
    RAW_C1_C2,
    RAW_C2_C3,
    RAW_C3_C4,
    RAW_RHYTHM,
    RAW_ROSC,
    RAW_DAY_7,
    RAW_CPC,
    RAW_UNIT_TYPE,
    RAW_CONSULTA,
    RAW_ANTECEDENTES,
    RAW_TECNICAS,
    RAW_EVOLUCION,
    RAW_HOSPITAL,
    RAW_HOUR_6,
    RAW_HOUR_24,
];

// Canonical output columns
pub const COL_ID: &str = "n_informe";
pub const COL_CALL_DATE: &str = "fecha";
pub const COL_AGE: &str = "edad";
pub const COL_SEX: &str = "sexo";
pub const COL_TELEPHONE_CPR: &str = "rcp_transtelefonica";
pub const COL_BYSTANDER_CPR: &str = "rcp_testigos";
pub const COL_RESPONDER: &str = "respondiente_rcp";
pub const COL_AED: &str = "desa_externo";
pub const COL_RHYTHM: &str = "ritmo";
pub const COL_ARRIVAL_TIME: &str = "tiempo_llegada_unidad";
pub const COL_CPR_TIME: &str = "tiempo_rcp";
pub const COL_ROSC: &str = "rosc";
pub const COL_SURVIVAL: &str = "supervivencia_7dias";
pub const COL_CPC: &str = "cpc";

/// Output column order of the cleaned case table.
pub const OUTPUT_COLUMNS: [&str; 14] = [
    COL_ID,
    COL_CALL_DATE,
    COL_AGE,
    COL_SEX,
    COL_TELEPHONE_CPR,
    COL_BYSTANDER_CPR,
    COL_RESPONDER,
    COL_AED,
    COL_RHYTHM,
    COL_ARRIVAL_TIME,
    COL_CPR_TIME,
    COL_ROSC,
    COL_SURVIVAL,
    COL_CPC,
];

/// Output columns restricted to 0/1.
pub const BOOLEAN_OUTPUT_COLUMNS: [&str; 6] = [
    COL_TELEPHONE_CPR,
    COL_BYSTANDER_CPR,
    COL_AED,
    COL_RHYTHM,
    COL_ROSC,
    COL_SURVIVAL,
];

// Unit type labels
pub const UNIT_ADVANCED: &str = "SVA";
pub const UNIT_BASIC: &str = "SVB";

// Default locations
pub const DEFAULT_CONFIG_FILE: &str = "tcpr.toml";
pub const DEFAULT_INPUT_FILE: &str = "data/raw/registro_pcr.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "data/cleaned";
pub const DEFAULT_LOG_DIR: &str = "logs";

// Output file names
pub const CASES_FILE: &str = "cleaned_cases.csv";
pub const EXCLUDED_CASES_FILE: &str = "excluded_cases.csv";
pub const EXCLUSIONS_REPORT_FILE: &str = "exclusions_report.txt";
pub const MANUAL_REVIEW_FILE: &str = "manual_review.txt";
pub const DIAGNOSTICS_FILE: &str = "diagnostics.ndjson";
pub const PDF_REPORT_FILE: &str = "report.pdf";
pub const METRICS_FILE: &str = "metrics.prom";

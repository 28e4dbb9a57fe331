use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use tcpr_pipeline::app::clean_use_case::CleanUseCase;
use tcpr_pipeline::config::Config;
use tcpr_pipeline::constants::{self, BOOLEAN_OUTPUT_COLUMNS, REQUIRED_RAW_COLUMNS};
use tcpr_pipeline::infra::{read_case_rows, write_case_rows};
use tcpr_pipeline::pipeline::ingestion::loader::read_incidents;
use tcpr_pipeline::pipeline::processing::classify::{DefaultTextClassifier, TextClassifier};
use tcpr_pipeline::pipeline::processing::filter::reorder;
use tcpr_pipeline::pipeline::processing::normalize::{DefaultFieldNormalizer, FieldNormalizer};
use tcpr_pipeline::pipeline::Pipeline;
use tcpr_pipeline::report::CohortSummary;

type Row<'a> = &'a [(&'a str, &'a str)];

/// Registry export text with every required column, blanks where unset
fn export(rows: &[Row<'_>]) -> String {
    let mut text = REQUIRED_RAW_COLUMNS.join(";");
    text.push('\n');
    for cells in rows {
        let line: Vec<&str> = REQUIRED_RAW_COLUMNS
            .iter()
            .map(|column| {
                cells
                    .iter()
                    .find(|(name, _)| name == column)
                    .map_or("", |(_, value)| *value)
            })
            .collect();
        text.push_str(&line.join(";"));
        text.push('\n');
    }
    text
}

fn cohort_export() -> String {
    export(&[
        &[
            ("NUM INFORME", "1"),
            ("FECHA_LLAMADA", "10/03/2023 14:05"),
            ("EDAD", "58"),
            ("SEXO", "M"),
            ("RCP_TRANSTELEFONICA", "0"),
            ("Tipo de Unidad", "SVA"),
            ("TECNICAS", "RCP, ROSC"),
            ("HOSPITAL", "UCI"),
            ("7 DIAS", "Alta, CPC 1"),
        ],
        &[
            ("NUM INFORME", "2"),
            ("FECHA_LLAMADA", "10/03/2023 14:00"),
            ("RCP_TRANSTELEFONICA", "1"),
            ("C0_C1", "120"),
            ("Tipo de Unidad", "SVB"),
        ],
        &[
            ("NUM INFORME", "3"),
            ("FECHA_LLAMADA", "11/03/2023 09:00"),
            ("EDAD", "77"),
            ("SEXO", "F"),
            ("RCP_TRANSTELEFONICA", "1"),
            ("Tipo de Unidad", "SVA"),
            ("CONSULTA", "Bomberos inician RCP"),
            ("TECNICAS", "Tras 12 minutos de RCP, exitus"),
        ],
        &[
            ("NUM INFORME", "4"),
            ("FECHA_LLAMADA", "12/03/2023 18:30"),
            ("RCP_TRANSTELEFONICA", "0"),
            ("Tipo de Unidad", "SVA"),
            ("CONSULTA", "Precipitado desde balcón"),
        ],
        &[
            ("NUM INFORME", "5"),
            ("FECHA_LLAMADA", "13/03/2023 07:45"),
            ("Tipo de Unidad", "SVA"),
            ("TECNICAS", "RCP 20 min, exitus"),
        ],
        &[
            ("NUM INFORME", "6"),
            ("FECHA_LLAMADA", "01/04/2023 12:00"),
            ("RCP_TRANSTELEFONICA", "1"),
            ("Tipo de Unidad", "SVB"),
        ],
    ])
}

fn write_input(dir: &Path, text: &str) -> Result<std::path::PathBuf> {
    let path = dir.join("registro.csv");
    fs::write(&path, text)?;
    Ok(path)
}

#[test]
fn test_full_run_writes_every_output() -> Result<()> {
    let dir = tempdir()?;
    let mut config = Config::default();
    config.input.path = write_input(dir.path(), &cohort_export())?;
    config.output.dir = dir.path().join("cleaned");
    config.output.write_pdf = true;

    let use_case = CleanUseCase::new(
        Pipeline::from_config(&config),
        CleanUseCase::outputs_for(&config.output),
    );
    let report = use_case.execute(&config.input)?;

    for file in [
        constants::CASES_FILE,
        constants::EXCLUDED_CASES_FILE,
        constants::EXCLUSIONS_REPORT_FILE,
        constants::MANUAL_REVIEW_FILE,
        constants::DIAGNOSTICS_FILE,
        constants::PDF_REPORT_FILE,
        constants::METRICS_FILE,
    ] {
        assert!(config.output.dir.join(file).exists(), "missing {}", file);
    }
    assert_eq!(report.written.len(), 7);

    let rows = read_case_rows(&config.output.cases_path())?;
    assert_eq!(rows, report.output.cases);
    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);

    // Basic unit back-fills the advanced report
    let merged = &rows[0];
    assert_eq!(merged.telephone_cpr, 1);
    assert_eq!(merged.arrival_time, Some(120));
    assert_eq!(merged.responder, "lego");
    assert_eq!((merged.rosc, merged.survival_7d, merged.cpc), (1, 1, 1));

    // Telephone CPR wins over the firefighter mention
    let narrated = &rows[1];
    assert_eq!(narrated.responder, "lego");
    assert_eq!(narrated.cpr_time, 720);
    assert_eq!((narrated.rosc, narrated.cpc), (0, 5));

    let stats = &report.output.exclusion_stats;
    assert_eq!(stats.excluded_traumatic, 1);
    assert_eq!(stats.excluded_missing_telephone_cpr, 1);
    assert_eq!(report.output.merge_stats.lost_telephone_cpr_ids, vec!["6".to_string()]);

    let exclusions = fs::read_to_string(config.output.dir.join(constants::EXCLUSIONS_REPORT_FILE))?;
    assert!(exclusions.contains("'precipitad' in consulta"));
    assert!(exclusions.contains(&report.output.run.input_sha256));

    let diagnostics = fs::read_to_string(config.output.dir.join(constants::DIAGNOSTICS_FILE))?;
    assert_eq!(diagnostics.lines().count(), 3);

    let pdf = fs::read(config.output.dir.join(constants::PDF_REPORT_FILE))?;
    assert!(pdf.starts_with(b"%PDF"));
    Ok(())
}

#[test]
fn test_output_holds_binary_flags_and_outcome_invariants() -> Result<()> {
    let dir = tempdir()?;
    let mut config = Config::default();
    config.input.path = write_input(dir.path(), &cohort_export())?;
    config.output.dir = dir.path().join("out");
    config.output.write_metrics = false;

    CleanUseCase::new(
        Pipeline::from_config(&config),
        CleanUseCase::outputs_for(&config.output),
    )
    .execute(&config.input)?;

    let mut reader = csv::Reader::from_path(config.output.cases_path())?;
    let headers = reader.headers()?.clone();
    let flag_indexes: Vec<usize> = BOOLEAN_OUTPUT_COLUMNS
        .iter()
        .filter_map(|column| headers.iter().position(|h| h == *column))
        .collect();
    assert_eq!(flag_indexes.len(), BOOLEAN_OUTPUT_COLUMNS.len());

    for record in reader.records() {
        let record = record?;
        for index in &flag_indexes {
            assert!(matches!(&record[*index], "0" | "1"), "non-binary flag {:?}", record);
        }
    }

    for row in read_case_rows(&config.output.cases_path())? {
        if row.cpc == 5 {
            assert_eq!(row.survival_7d, 0);
        }
        if row.rosc == 0 {
            assert_eq!(row.cpc, 5);
        }
        if row.bystander_cpr == 0 {
            assert!(row.responder.is_empty());
        }
    }
    Ok(())
}

#[test]
fn test_complete_row_round_trips_through_the_cleaned_table() -> Result<()> {
    let text = export(&[&[
        ("NUM INFORME", "900"),
        ("FECHA_LLAMADA", "2023-06-01 21:15:00"),
        ("EDAD", "66"),
        ("SEXO", "F"),
        ("RCP_TRANSTELEFONICA", "1"),
        ("DESA_EXTERNO", "Verdadero"),
        ("RCP_TESTIGOS", "1"),
        ("C0_C1", "60"),
        ("C1_C2", "240"),
        ("C2_C3", "300"),
        ("C3_C4", "0"),
        ("RITMO INICIAL", "FV"),
        ("Tipo de Unidad", "SVA"),
        ("CONSULTA", "PCR presenciada en domicilio"),
        ("TECNICAS", "RCP 25 min, ROSC"),
        ("HOSPITAL", "Ingresa en UCI"),
        ("7 DIAS", "Alta, CPC 2"),
    ]]);

    let incidents = read_incidents(text.as_bytes(), b';', "memory")?;
    let normalized = DefaultFieldNormalizer::new().normalize_all(incidents);
    let derived = DefaultTextClassifier::new().classify_all(normalized);
    let rows = reorder(&derived);

    let dir = tempdir()?;
    let path = dir.path().join("cases.csv");
    write_case_rows(&path, &rows)?;
    let reread = read_case_rows(&path)?;

    assert_eq!(reread, rows);
    let row = &reread[0];
    assert_eq!(row.call_date, "2023-06-01 21:15:00");
    assert_eq!(row.age, Some(66));
    assert_eq!(row.aed, 1);
    assert_eq!(row.shockable_rhythm, 1);
    assert_eq!(row.arrival_time, Some(600));
    assert_eq!(row.cpc, 2);
    Ok(())
}

#[test]
fn test_summary_guards_empty_telephone_cpr_group() -> Result<()> {
    let text = export(&[&[
        ("NUM INFORME", "1"),
        ("FECHA_LLAMADA", "2023-06-01 10:00:00"),
        ("RCP_TRANSTELEFONICA", "0"),
        ("Tipo de Unidad", "SVA"),
        ("TECNICAS", "RCP 30 min, exitus"),
    ]]);
    let incidents = read_incidents(text.as_bytes(), b';', "memory")?;
    let output = Pipeline::default().process(
        incidents,
        tcpr_pipeline::pipeline::RunInfo::new("memory".into(), String::new()),
    );

    let summary = CohortSummary::compute(&output.cases);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.by_telephone_cpr[0].rosc.pct(), None);
    assert_eq!(summary.by_telephone_cpr[1].rosc.pct(), Some(0.0));
    Ok(())
}

#[test]
fn test_extreme_cells_degrade_without_aborting_the_run() -> Result<()> {
    let text = export(&[&[
        ("NUM INFORME", "10"),
        ("FECHA_LLAMADA", "01/04/2023 10:00"),
        ("RCP_TRANSTELEFONICA", "1"),
        ("C0_C1", "1e18"),
        ("C1_C2", "9e18"),
        ("C2_C3", "-300"),
        ("Tipo de Unidad", "SVA"),
        ("CONSULTA", "PCR presenciada en domicilio"),
        ("EVOLUCION", "rcp 999999999999999999 horas, exitus a las 10:45"),
        ("7 DIAS", "Fallece por lesión cerebral anóxica"),
    ]]);
    let incidents = read_incidents(text.as_bytes(), b';', "memory")?;
    let output = Pipeline::default().process(
        incidents,
        tcpr_pipeline::pipeline::RunInfo::new("memory".into(), String::new()),
    );

    assert_eq!(output.exclusion_stats.excluded_traumatic, 0);
    assert_eq!(output.cases.len(), 1);
    let row = &output.cases[0];
    assert_eq!(row.arrival_time, None);
    assert_eq!(row.cpr_time, 45 * 60);
    assert_eq!((row.rosc, row.cpc), (0, 5));
    Ok(())
}

//! CSV and JSON export builders
//!
//! Layout mirrors what the report consumers already process: a metadata
//! preamble, a header row, then data rows, semicolon-delimited, decimal
//! comma. Fields containing the delimiter or quotes are double-quote
//! wrapped with internal quotes doubled, which is exactly the convention
//! the catalog import parser reads back.

use shared::report::UNCATEGORIZED;
use shared::{
    ConsolidatedRow, ConsolidatedTotals, CountedRowFlat, CounterAnalysisRow, SessionReportTotals,
};

use crate::utils::time::{format_date_br, format_iso, format_time_br};

const DELIMITER: char = ';';

/// Format a decimal with the requested precision, comma as the separator.
pub fn decimal_comma(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}").replace('.', ",")
}

/// Quote a CSV field when it needs it (embedded delimiter, quote or edge
/// whitespace); doubled quotes escape literal quotes.
pub fn csv_field(value: &str) -> String {
    let needs_quoting = value.contains(DELIMITER)
        || value.contains('"')
        || value.starts_with(' ')
        || value.ends_with(' ');
    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn line(fields: &[String]) -> String {
    fields.join(&DELIMITER.to_string())
}

fn category_label(category: Option<&str>) -> String {
    category.unwrap_or(UNCATEGORIZED).to_string()
}

// =============================================================================
// Per-session report
// =============================================================================

/// Session report CSV: preamble (user, date, time, totals), header, rows.
pub fn build_session_csv(
    user_name: &str,
    generated_at: i64,
    rows: &[CountedRowFlat],
    totals: &SessionReportTotals,
) -> String {
    let mut out = Vec::new();
    out.push("RELATÓRIO DE CONTAGEM DE ESTOQUE".to_string());
    out.push(String::new());
    out.push(line(&["Usuário:".into(), csv_field(user_name)]));
    out.push(line(&["Data:".into(), format_date_br(generated_at)]));
    out.push(line(&["Hora:".into(), format_time_br(generated_at)]));
    out.push(line(&["Total de Itens:".into(), totals.total_items.to_string()]));
    out.push(line(&[
        "Total de Unidades:".into(),
        decimal_comma(totals.total_units, 2),
    ]));
    out.push(String::new());
    out.push("CÓDIGO;DESCRIÇÃO;QUANTIDADE;UNIDADE;CATEGORIA;NÚM. REGISTROS".to_string());

    for row in rows {
        out.push(line(&[
            csv_field(&row.code),
            csv_field(&row.description),
            decimal_comma(row.quantity, 2),
            csv_field(&row.unit),
            csv_field(&category_label(row.category.as_deref())),
            row.record_count.to_string(),
        ]));
    }

    out.join("\n")
}

/// Session report JSON: `meta` block plus the row array.
pub fn build_session_json(
    user_name: &str,
    generated_at: i64,
    rows: &[CountedRowFlat],
    totals: &SessionReportTotals,
) -> serde_json::Value {
    serde_json::json!({
        "meta": {
            "usuario": user_name,
            "data": format_date_br(generated_at),
            "hora": format_time_br(generated_at),
            "dataISO": format_iso(generated_at),
            "totalItens": totals.total_items,
            "totalUnidades": totals.total_units,
            "totalRegistros": totals.total_records,
        },
        "dados": rows,
    })
}

// =============================================================================
// Consolidated report
// =============================================================================

/// Consolidated report CSV: generation metadata, totals preamble, header,
/// rows, TOTAL footer.
pub fn build_consolidated_csv(
    generated_at: i64,
    rows: &[ConsolidatedRow],
    totals: &ConsolidatedTotals,
) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "RELATÓRIO CONSOLIDADO DE CONTAGEM - {}",
        format_date_br(generated_at)
    ));
    out.push(String::new());
    out.push(line(&[
        "Data/Hora de Geração:".into(),
        format!(
            "{} {}",
            format_date_br(generated_at),
            format_time_br(generated_at)
        ),
    ]));
    out.push(line(&[
        "Total de Itens Únicos:".into(),
        totals.unique_items.to_string(),
    ]));
    out.push(line(&[
        "Total de Unidades Contadas:".into(),
        decimal_comma(totals.total_units, 2),
    ]));
    out.push(line(&[
        "Total de Registros:".into(),
        totals.total_records.to_string(),
    ]));
    out.push(line(&[
        "Total de Contadores:".into(),
        totals.distinct_contributors.to_string(),
    ]));
    out.push(line(&[
        "Total de Sessões:".into(),
        totals.session_count.to_string(),
    ]));
    out.push(String::new());
    out.push("CÓDIGO;DESCRIÇÃO;CATEGORIA;QUANTIDADE;UNIDADE;NÚM. REGISTROS;CONTADORES".to_string());

    for row in rows {
        out.push(line(&[
            csv_field(&row.code),
            csv_field(&row.description),
            csv_field(&category_label(row.category.as_deref())),
            decimal_comma(row.quantity, 2),
            csv_field(&row.unit),
            row.record_count.to_string(),
            csv_field(&row.contributors.join(", ")),
        ]));
    }

    out.push(String::new());
    out.push(line(&[
        "TOTAL".into(),
        String::new(),
        String::new(),
        decimal_comma(totals.total_units, 2),
        String::new(),
        totals.total_records.to_string(),
        totals.distinct_contributors.to_string(),
    ]));

    out.join("\n")
}

/// Consolidated report JSON: `meta` block with totals plus the row array.
pub fn build_consolidated_json(
    generated_at: i64,
    rows: &[ConsolidatedRow],
    totals: &ConsolidatedTotals,
) -> serde_json::Value {
    serde_json::json!({
        "meta": {
            "tipoRelatorio": "CONSOLIDADO",
            "dataGeracao": format_date_br(generated_at),
            "horaGeracao": format_time_br(generated_at),
            "dataISO": format_iso(generated_at),
            "totalItensUnicos": totals.unique_items,
            "totalUnidades": totals.total_units,
            "totalRegistros": totals.total_records,
            "totalContadores": totals.distinct_contributors,
            "totalSessoes": totals.session_count,
        },
        "items": rows,
    })
}

// =============================================================================
// Counter performance analysis
// =============================================================================

/// Counter-analysis CSV: title, date/time, header, rows.
pub fn build_counter_analysis_csv(generated_at: i64, rows: &[CounterAnalysisRow]) -> String {
    let mut out = Vec::new();
    out.push("ANÁLISE DE PERFORMANCE DOS CONTADORES".to_string());
    out.push(String::new());
    out.push(line(&["Data:".into(), format_date_br(generated_at)]));
    out.push(line(&["Hora:".into(), format_time_br(generated_at)]));
    out.push(String::new());
    out.push(
        "CONTADOR;TOTAL SESSÕES;TOTAL ITENS;TOTAL UNIDADES;TEMPO TOTAL (min);\
         MÉDIA ITENS/SESSÃO;MÉDIA UNIDADES/SESSÃO;ITENS/MIN;UNIDADES/MIN"
            .to_string(),
    );

    for row in rows {
        out.push(line(&[
            csv_field(&row.name),
            row.session_count.to_string(),
            row.total_items.to_string(),
            decimal_comma(row.total_units, 2),
            decimal_comma(row.total_minutes, 1),
            decimal_comma(row.avg_items_per_session, 1),
            decimal_comma(row.avg_units_per_session, 1),
            decimal_comma(row.items_per_minute, 2),
            decimal_comma(row.units_per_minute, 2),
        ]));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::report::{consolidate, session_report, totals};

    fn sample_rows() -> Vec<CountedRowFlat> {
        vec![
            CountedRowFlat {
                code: "ADUBO001".into(),
                description: "Adubo NPK 10-10-10 (50kg)".into(),
                category: Some("Fertilizantes".into()),
                barcode: Some("7891000100101".into()),
                unit: "UN".into(),
                quantity: 12.5,
                record_count: 3,
                counted_by: "Ana".into(),
                last_updated_at: 1_772_721_000_000,
            },
            CountedRowFlat {
                code: "FECHO839".into(),
                description: "FECHO 3\" REF:839; PORTA CADEADO".into(),
                category: None,
                barcode: None,
                unit: "UN".into(),
                quantity: 4.0,
                record_count: 1,
                counted_by: "Rui".into(),
                last_updated_at: 1_772_721_000_000,
            },
        ]
    }

    #[test]
    fn decimal_comma_replaces_separator() {
        assert_eq!(decimal_comma(12.5, 2), "12,50");
        assert_eq!(decimal_comma(3.0, 1), "3,0");
    }

    #[test]
    fn fields_with_delimiter_or_quotes_are_wrapped() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a;b"), "\"a;b\"");
        assert_eq!(csv_field("3\" REF"), "\"3\"\" REF\"");
    }

    #[test]
    fn session_csv_has_preamble_header_and_rows() {
        let (rows, t) = session_report(sample_rows());
        let csv = build_session_csv("Ana", 1_772_721_000_000, &rows, &t);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "RELATÓRIO DE CONTAGEM DE ESTOQUE");
        assert_eq!(lines[2], "Usuário:;Ana");
        assert_eq!(lines[3], "Data:;05/03/2026");
        assert_eq!(lines[5], "Total de Itens:;2");
        assert_eq!(lines[6], "Total de Unidades:;16,50");
        assert_eq!(
            lines[8],
            "CÓDIGO;DESCRIÇÃO;QUANTIDADE;UNIDADE;CATEGORIA;NÚM. REGISTROS"
        );
        // First data row sorted by code
        assert!(lines[9].starts_with("ADUBO001;"));
        assert!(lines[9].contains("12,50"));
        // Quoted description with embedded delimiter and doubled quote
        assert!(lines[10].contains("\"FECHO 3\"\" REF:839; PORTA CADEADO\""));
        assert!(lines[10].contains("SEM CATEGORIA"));
    }

    #[test]
    fn consolidated_csv_ends_with_total_footer() {
        let report = consolidate(&sample_rows());
        let t = totals(&report, 2);
        let csv = build_consolidated_csv(1_772_721_000_000, &report, &t);
        let lines: Vec<&str> = csv.lines().collect();

        let footer = lines.last().unwrap();
        assert!(footer.starts_with("TOTAL;;;16,50;;4;2"));
        assert_eq!(
            lines[9],
            "CÓDIGO;DESCRIÇÃO;CATEGORIA;QUANTIDADE;UNIDADE;NÚM. REGISTROS;CONTADORES"
        );
    }

    #[test]
    fn session_json_meta_matches_totals() {
        let (rows, t) = session_report(sample_rows());
        let json = build_session_json("Ana", 1_772_721_000_000, &rows, &t);
        assert_eq!(json["meta"]["usuario"], "Ana");
        assert_eq!(json["meta"]["totalItens"], 2);
        assert_eq!(json["meta"]["totalRegistros"], 4);
        assert_eq!(json["dados"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn consolidated_json_uses_items_key() {
        let report = consolidate(&sample_rows());
        let t = totals(&report, 2);
        let json = build_consolidated_json(1_772_721_000_000, &report, &t);
        assert_eq!(json["meta"]["tipoRelatorio"], "CONSOLIDADO");
        assert_eq!(json["meta"]["totalSessoes"], 2);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }
}

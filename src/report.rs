//! 日報メッセージ組み立てモジュール
//!
//! 日報の下書きと在庫から、共有用のステータステキストを決定的に
//! 組み立てる。状態は持たず、変更のたびに再計算される。

use crate::types::{InventoryItem, MaterialSchedule, ReportDraft};

/// 日報メッセージ全体を組み立てる
pub fn compose_message(report: &ReportDraft, inventory: &[InventoryItem]) -> String {
    let mut lines = vec![
        "【日報】".to_string(),
        format_report_number(&report.loss),
        format_report_number(&report.set_count),
        format_report_number(&report.operation_hours),
        String::new(),
        format_currency(&report.sales),
        String::new(),
        format_insights(&report.insights),
    ];

    if let Some(schedule) = &report.material_received_at {
        lines.push(String::new());
        lines.push(material_received_line(schedule));
    }

    lines.push(String::new());
    lines.extend(shortage_request_lines(inventory));

    lines.join("\n")
}

/// 数値として読めれば最小表記、読めなければ入力テキストをそのまま返す
fn format_report_number(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "0".to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => format_minimal(n),
        _ => trimmed.to_string(),
    }
}

/// 売上金額を3桁区切りで整形する（数値として読めなければ0扱い）
fn format_currency(value: &str) -> String {
    let numeric = value.trim().parse::<f64>().ok().filter(|n| n.is_finite());
    group_thousands(&format_minimal(numeric.unwrap_or(0.0)))
}

fn format_insights(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        "特記事項なし。".to_string()
    } else {
        trimmed.to_string()
    }
}

/// f64の最小表記（整数なら小数点なし）
fn format_minimal(n: f64) -> String {
    format!("{}", n)
}

/// 整数部に3桁区切りのカンマを挿入する
fn group_thousands(raw: &str) -> String {
    let (sign, rest) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn material_received_line(schedule: &MaterialSchedule) -> String {
    use chrono::Datelike;
    format!(
        "{}/{}/{} {}ごろに材料受け取り予定です。",
        schedule.date.year(),
        schedule.date.month(),
        schedule.date.day(),
        schedule.time.format("%H:%M"),
    )
}

/// 必要材料ブロック（不足のある品目だけ列挙）
fn shortage_request_lines(inventory: &[InventoryItem]) -> Vec<String> {
    let shortages: Vec<(&str, u32)> = inventory
        .iter()
        .filter(|item| item.shortage() > 0)
        .map(|item| (item.name.as_str(), item.shortage()))
        .collect();

    if shortages.is_empty() {
        return vec!["【必要材料】なし（理想在庫クリア）".to_string()];
    }

    let mut lines = vec!["【必要材料】".to_string()];
    for (name, shortage) in shortages {
        lines.push(format!("{}：{}", name, shortage));
    }
    lines
}

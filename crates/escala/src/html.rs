use anyhow::{Context, Result};
use chrono::Datelike;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fs;
use std::path::Path;

use crate::board::{DayCell, PendingForm, ScheduleBoard};
use crate::calendar::{month_name, CalendarMonth, DAYS_IN_WEEK, WEEKDAY_NAMES};
use crate::types::{Period, PendingRow};

/// Background of a cell where two assignments share a period
const CONFLICT_BACKGROUND: &str = "#fff3e0";

/// Values shown in the generate form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub year: i32,
    pub month: u32,
}

/// Everything the page needs to render
pub struct PageView<'a> {
    pub board: &'a ScheduleBoard,
    pub form: &'a PendingForm,
    pub selection: Selection,
    pub notice: Option<&'a str>,
}

/// Write a static HTML page of the board
pub fn generate_html(board: &ScheduleBoard, path: &Path) -> Result<()> {
    let selection = board
        .month()
        .map(|m| Selection {
            year: m.year,
            month: m.month,
        })
        .context("No calendar generated")?;

    let form = PendingForm::new();
    let html = render_page(&PageView {
        board,
        form: &form,
        selection,
        notice: None,
    });
    fs::write(path, html.into_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn render_page(view: &PageView<'_>) -> Markup {
    html! {
        (DOCTYPE)
        html lang="pt-BR" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { "Auditoria" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.container {
                    h1 { "Auditoria" }
                    @if let Some(notice) = view.notice {
                        div.notice role="alert" { (notice) }
                    }
                    // One form so every action posts both the month and the draft rows
                    form #"board-form" method="post" action="/submit" {
                        (render_generate_panel(view.selection))
                        (render_pending_form(view.form))
                    }
                    @if let Some(month) = view.board.month() {
                        (render_calendar(month, view.board))
                    }
                }
            }
        }
    }
}

fn render_generate_panel(selection: Selection) -> Markup {
    html! {
        section.panel {
            h2 { "Gerar Calendário" }
            div.row {
                label {
                    "Mês"
                    select name="month" {
                        @for month in 1..=12u32 {
                            option value=(month) selected[month == selection.month] {
                                (month_name(month).unwrap_or_default())
                            }
                        }
                    }
                }
                label {
                    "Ano"
                    input type="number" name="year" value=(selection.year);
                }
                button.primary type="submit" formaction="/generate" { "Gerar Calendário" }
                button.warning type="submit" formaction="/clear" { "Limpar Calendário" }
            }
        }
    }
}

fn render_pending_form(form: &PendingForm) -> Markup {
    html! {
        section.panel {
            h2 { "Adicionar Profissionais" }
            div.pending-rows {
                @for (idx, row) in form.rows().iter().enumerate() {
                    (render_pending_row(idx, row))
                }
                div.actions {
                    button.outlined type="submit" formaction="/rows/add" { "+ Adicionar Outro Profissional" }
                    button.primary type="submit" formaction="/submit" { "Escalar Todos" }
                }
            }
        }
    }
}

fn render_pending_row(idx: usize, row: &PendingRow) -> Markup {
    html! {
        div.row.pending-row data-row=(idx) {
            label {
                "Nome"
                input type="text" name={"name-" (idx)} value=(row.name) autocomplete="off";
            }
            label {
                "Turno"
                select name={"period-" (idx)} {
                    @for period in [Period::Day, Period::Night] {
                        option value=(period.label()) selected[period == row.period] { (period.label()) }
                    }
                    @if let Period::Other(label) = &row.period {
                        option value=(label) selected { (label) }
                    }
                }
            }
            label {
                "Dias"
                input type="text" name={"days-" (idx)} value=(row.days)
                    placeholder="Ex: 1, 2, 3 ou 1 2 3" autocomplete="off";
            }
            label.checkbox {
                input type="checkbox" name={"paid-" (idx)} value="on" checked[row.paid_in_cash];
                "Pago à vista"
            }
            button.delete type="submit" formaction={"/rows/" (idx) "/remove"} title="Remover" { "✕" }
        }
    }
}

fn render_calendar(month: &CalendarMonth, board: &ScheduleBoard) -> Markup {
    html! {
        section.panel {
            h2.center { (month.title()) }
            table.calendar {
                thead {
                    tr {
                        @for name in WEEKDAY_NAMES {
                            th { (name) }
                        }
                    }
                }
                tbody {
                    @for week in board.cells() {
                        tr {
                            // Short weeks render their missing columns empty
                            @for col in 0..DAYS_IN_WEEK {
                                @match week.get(col).and_then(Option::as_ref) {
                                    Some(cell) => { (render_day_cell(cell)) }
                                    None => { td {} }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_day_cell(cell: &DayCell<'_>) -> Markup {
    let style = if cell.conflict {
        format!("background-color: {CONFLICT_BACKGROUND}")
    } else {
        "background-color: inherit".to_string()
    };

    html! {
        td.conflict[cell.conflict] style=(style) {
            div.day-number { (cell.date.day()) }
            @for assignment in &cell.assignments {
                div.assignment style={"color: " (assignment.period.color())} {
                    (assignment.label())
                }
            }
        }
    }
}

const CSS: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Roboto', sans-serif;
    background: #f5f5f5;
    color: #222;
    line-height: 1.4;
}

.container {
    max-width: 1100px;
    margin: 0 auto;
    padding: 24px;
}

h1 {
    font-size: 2.1em;
    font-weight: 400;
    margin-bottom: 16px;
}

h2 {
    font-size: 1.25em;
    font-weight: 500;
    margin-bottom: 12px;
}

.center {
    text-align: center;
}

.panel {
    background: #fff;
    padding: 24px;
    margin-bottom: 24px;
    border-radius: 4px;
    box-shadow: 0 2px 4px rgba(0,0,0,0.15);
}

.row {
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
    gap: 16px;
    align-items: end;
    margin-top: 8px;
}

label {
    display: flex;
    flex-direction: column;
    font-size: 0.85em;
    color: #555;
    gap: 4px;
}

label.checkbox {
    flex-direction: row;
    align-items: center;
}

input[type="text"], input[type="number"], select {
    padding: 10px;
    font-size: 1.1em;
    border: 1px solid #bbb;
    border-radius: 4px;
}

button {
    padding: 10px 16px;
    font-size: 0.9em;
    text-transform: uppercase;
    border: none;
    border-radius: 4px;
    cursor: pointer;
}

button.primary { background: #1976d2; color: #fff; }
button.warning { background: #ed6c02; color: #fff; }
button.outlined { background: transparent; color: #1976d2; border: 1px solid #1976d2; margin-right: 16px; }
button.delete { background: transparent; color: #d32f2f; font-size: 1.2em; justify-self: start; }

.actions {
    margin-top: 16px;
}

.notice {
    background: #fdecea;
    color: #611a15;
    padding: 12px 16px;
    margin-bottom: 16px;
    border-radius: 4px;
}

table.calendar {
    width: 100%;
    border-collapse: collapse;
}

table.calendar th, table.calendar td {
    border-bottom: 1px solid #e0e0e0;
    padding: 12px 8px;
    text-align: center;
    vertical-align: top;
    width: 14.28%;
}

.day-number {
    font-weight: 500;
}

.assignment {
    font-size: 0.875em;
}
"#;

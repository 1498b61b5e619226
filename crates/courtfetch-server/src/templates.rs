use courtfetch_core::model::QueryLog;
use std::fmt::Write;

const STYLE: &str = r#"
    body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background-color: #f4f7f8; margin: 0; padding: 0; }
    .container { max-width: 1000px; margin: 20px auto; padding: 30px; }
    h1, h2 { text-align: center; color: #333; }
    a { color: #1e88e5; text-decoration: none; }
    a:hover { text-decoration: underline; }
    .flash { background-color: #fff3cd; padding: 12px 15px; border-left: 5px solid #ffc107; margin-bottom: 20px; border-radius: 6px; font-weight: bold; color: #856404; }
    form { display: flex; flex-wrap: wrap; gap: 15px; justify-content: space-between; background: #fff; padding: 20px; border-radius: 10px; box-shadow: 0 4px 10px rgba(0,0,0,0.1); margin-bottom: 30px; }
    label { flex: 1 1 45%; display: flex; flex-direction: column; font-weight: bold; color: #555; }
    input, select { padding: 8px 10px; margin-top: 5px; border: 1px solid #ccc; border-radius: 6px; font-size: 14px; }
    input[type="submit"] { background-color: #1e88e5; color: white; font-weight: bold; border: none; cursor: pointer; flex: 1 1 100%; padding: 12px; font-size: 16px; }
    input[type="submit"]:hover { background-color: #1565c0; }
    .history-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 20px; }
    .card { background: #fff; border-radius: 10px; box-shadow: 0 4px 8px rgba(0,0,0,0.1); padding: 20px; }
    .card h3 { margin-top: 0; color: #1e88e5; }
    .status-badge { display: inline-block; padding: 4px 10px; border-radius: 12px; font-size: 12px; font-weight: bold; color: white; }
    .status-ok { background-color: #4caf50; }
    .status-error { background-color: #f44336; }
    .status-pending { background-color: #9e9e9e; }
    .status-interrupted { background-color: #ff9800; }
    .pdf-btn { display: inline-block; padding: 6px 12px; margin-top: 10px; background-color: #1e88e5; color: white; border-radius: 6px; font-size: 13px; }
    .cause-list { margin-top: 40px; }
"#;

pub fn render_index(flashes: &[String], courts: &[&str], rows: &[QueryLog]) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"UTF-8\">\n  <title>Court Data Fetcher</title>\n");
    let _ = writeln!(html, "  <style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<div class=\"container\">\n<h1>Court Data Fetcher</h1>\n");

    for msg in flashes {
        let _ = writeln!(html, "<div class=\"flash\">{}</div>", escape(msg));
    }

    html.push_str("<form method=\"post\" action=\"/fetch\">\n");
    html.push_str("  <label>Select Court:\n    <select name=\"court\" required>\n");
    for court in courts {
        let c = escape(court);
        let _ = writeln!(html, "      <option value=\"{c}\">{c}</option>");
    }
    html.push_str("    </select>\n  </label>\n");
    html.push_str("  <label>Case Type:\n    <input name=\"case_type\" required>\n  </label>\n");
    html.push_str("  <label>Case Number:\n    <input name=\"case_number\" required>\n  </label>\n");
    html.push_str("  <label>Year:\n    <input name=\"year\">\n  </label>\n");
    html.push_str("  <input type=\"submit\" value=\"Fetch Case\">\n</form>\n");

    html.push_str("<h2>Query History</h2>\n<div class=\"history-grid\">\n");
    for row in rows {
        render_card(&mut html, row);
    }
    html.push_str("</div>\n");

    let default_court = courts.first().copied().unwrap_or("");
    html.push_str("<div class=\"cause-list\">\n<h2>Cause List</h2>\n");
    html.push_str("<form method=\"post\" action=\"/causelist\">\n");
    let _ = writeln!(
        html,
        "  <label>Court ID:\n    <input name=\"court\" value=\"{}\">\n  </label>",
        escape(default_court)
    );
    html.push_str(
        "  <label>Date (YYYY-MM-DD, optional for today):\n    <input name=\"date\">\n  </label>\n",
    );
    html.push_str("  <input type=\"submit\" value=\"Download Cause List\">\n</form>\n</div>\n");

    html.push_str("</div>\n</body>\n</html>\n");
    html
}

fn render_card(html: &mut String, row: &QueryLog) {
    let status = row.status.label();
    html.push_str("<div class=\"card\">\n");
    let _ = writeln!(html, "  <h3>{}</h3>", escape(&row.case_label()));
    let _ = writeln!(html, "  <p><strong>Court:</strong> {}</p>", escape(&row.court));
    let _ = writeln!(html, "  <p><strong>Time:</strong> {}</p>", escape(&row.created_at));
    let _ = writeln!(
        html,
        "  <p><strong>Status:</strong> <span class=\"status-badge status-{status}\">{status}</span></p>"
    );
    if row.pdf_path.is_some() {
        let _ = writeln!(
            html,
            "  <a class=\"pdf-btn\" href=\"/download/{}\">Download PDF</a>",
            row.id
        );
    }
    html.push_str("</div>\n");
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

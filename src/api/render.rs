//! HTML rendering for the query page

use crate::rag::QueryResult;
use std::fmt::Write;

/// Escape text for HTML element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Body of the response section
pub enum PageBody<'a> {
    Empty,
    Answer(&'a QueryResult),
    Error(&'a str),
}

pub fn page(title: &str, query: &str, body: PageBody<'_>) -> String {
    let mut html = String::new();
    let title = escape(title);

    let _ = write!(
        html,
        "<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n<h1>{title}</h1>\n\
         <form action=\"/\" method=\"post\">\n\
         <input type=\"text\" name=\"query\" value=\"{}\"/>\n\
         <input type=\"submit\" value=\"Query\"/>\n</form>\n\n<h2>Response</h2>\n",
        escape(query)
    );

    match body {
        PageBody::Empty => html.push_str("<p>Submit a query to get a response.</p>\n"),
        PageBody::Error(message) => {
            let _ = writeln!(html, "<p class=\"error\">Query failed: {}</p>", escape(message));
        }
        PageBody::Answer(result) => render_answer(&mut html, result),
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_answer(html: &mut String, result: &QueryResult) {
    let answer = &result.answer;
    let _ = writeln!(html, "<p>Commentary: {}</p>", escape(&answer.commentary));

    if answer.citations.is_empty() {
        html.push_str("<p>No citations.</p>\n");
        return;
    }

    html.push_str("References:\n<ul>\n");
    for citation in &answer.citations {
        let _ = write!(html, "<li>{}", escape(&citation.claim));
        for reference in &citation.references {
            let file = &reference.reference.file;
            if reference.exists() {
                let _ = write!(
                    html,
                    " <a href=\"/references/{}\" title=\"{}\">{}</a>",
                    urlencoding::encode(file),
                    escape(&reference.reference.excerpt),
                    escape(file)
                );
            } else {
                let _ = write!(
                    html,
                    " <span class=\"unverified\">{} (not found)</span>",
                    escape(file)
                );
            }
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
}

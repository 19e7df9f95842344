//! HTML 渲染服务 - 业务能力层
//!
//! 把状态快照渲染成可打印的 A4 页面，只读快照，不修改任何状态

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{Section, SectionKind, WorksheetDocument};
use crate::workflow::WorksheetSnapshot;

const PAGE_STYLE: &str = r#"
body { background: #f9fafb; font-family: "Comic Neue", "Comic Sans MS", sans-serif; color: #111827; }
.page { background: #fff; max-width: 210mm; min-height: 297mm; margin: 0 auto; padding: 20mm; box-sizing: border-box; }
.header { border-bottom: 2px solid #1f2937; padding-bottom: 16px; margin-bottom: 32px; display: flex; justify-content: space-between; align-items: flex-end; }
.header h1 { font-size: 2.25rem; margin: 0 0 8px; }
.meta { color: #4b5563; font-size: 1.1rem; margin: 0; }
.blank { display: inline-block; width: 12rem; border-bottom: 2px solid #9ca3af; }
.section { break-inside: avoid; margin-bottom: 32px; }
.section h3 { font-size: 1.5rem; margin: 0 0 12px; }
.content { white-space: pre-line; font-size: 1.1rem; line-height: 1.6; }
.question { display: flex; gap: 12px; margin-left: 16px; }
.writing-line { height: 2rem; border-bottom: 1px dashed #d1d5db; }
.frame { border: 4px solid #1f2937; border-radius: 12px; padding: 8px; text-align: center; }
.frame img { max-height: 300px; }
.placeholder { height: 16rem; border: 4px dashed #d1d5db; border-radius: 12px; display: flex; align-items: center; justify-content: center; color: #9ca3af; font-style: italic; }
.footer { margin-top: 64px; padding-top: 32px; border-top: 1px solid #e5e7eb; text-align: center; color: #9ca3af; font-size: 0.9rem; }
.banner { text-align: center; color: #2563eb; }
.hint { text-align: center; color: #9ca3af; font-size: 0.75rem; margin-top: 8px; }
@media print { body { background: #fff; } .no-print { display: none; } .page { padding: 0; } }
"#;

/// 渲染整个页面
pub fn render_worksheet_html(snapshot: &WorksheetSnapshot) -> String {
    let body = match &snapshot.document {
        Some(document) => {
            let banner = if snapshot.is_generating_images() {
                "<p class=\"banner no-print\">Generating Images...</p>\n"
            } else {
                ""
            };
            format!("{}{}", banner, render_document(document))
        }
        None => render_empty(),
    };

    let title = snapshot
        .document
        .as_ref()
        .map(|d| d.title.as_str())
        .unwrap_or("SmartWorksheet AI");

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        encode_text(title),
        PAGE_STYLE,
        body
    )
}

fn render_empty() -> String {
    "<div class=\"page placeholder\">\n<p>Your worksheet will appear here</p>\n<p>Fill out the form to get started</p>\n</div>\n"
        .to_string()
}

fn render_document(document: &WorksheetDocument) -> String {
    let mut html = String::new();
    html.push_str("<div class=\"page\" id=\"printable-area\">\n");

    html.push_str(&format!(
        "<div class=\"header\">\n<div>\n<h1>{}</h1>\n<p class=\"meta\">{} • {}</p>\n</div>\n\
         <div>\n<p><b>Name:</b> <span class=\"blank\"></span></p>\n<p><b>Date:</b> <span class=\"blank\"></span></p>\n</div>\n</div>\n",
        encode_text(&document.title),
        encode_text(&document.subject),
        encode_text(&document.grade_level)
    ));

    for section in &document.sections {
        html.push_str(&render_section(section));
    }

    html.push_str("<div class=\"footer\"><p>Created with SmartWorksheet AI • Great job!</p></div>\n");
    html.push_str("</div>\n");
    html
}

fn render_section(section: &Section) -> String {
    let mut html = format!(
        "<div class=\"section\" data-id=\"{}\">\n",
        encode_double_quoted_attribute(&section.id)
    );

    if let Some(title) = &section.title {
        html.push_str(&format!("<h3>{}</h3>\n", encode_text(title)));
    }
    if let Some(content) = &section.content {
        html.push_str(&format!("<p class=\"content\">{}</p>\n", encode_text(content)));
    }

    match (section.kind, &section.items) {
        (SectionKind::Question, Some(items)) => {
            for (idx, item) in items.iter().enumerate() {
                html.push_str(&format!(
                    "<div class=\"question\"><b>{}.</b><div style=\"flex:1\"><p>{}</p>\
                     <div class=\"writing-line\"></div><div class=\"writing-line\"></div></div></div>\n",
                    idx + 1,
                    encode_text(item)
                ));
            }
        }
        (SectionKind::Activity, Some(items)) => {
            html.push_str("<ul>\n");
            for item in items {
                html.push_str(&format!("<li>{}</li>\n", encode_text(item)));
            }
            html.push_str("</ul>\n");
        }
        (SectionKind::Image, _) => html.push_str(&render_image(section)),
        _ => {}
    }

    html.push_str("</div>\n");
    html
}

fn render_image(section: &Section) -> String {
    match &section.image_url {
        Some(url) => {
            let alt = section
                .image_description
                .as_deref()
                .unwrap_or("Worksheet illustration");
            format!(
                "<div class=\"frame\"><img src=\"{}\" alt=\"{}\"></div>\n",
                encode_double_quoted_attribute(url),
                encode_double_quoted_attribute(alt)
            )
        }
        None if section.is_generating_image => {
            "<div class=\"placeholder\">Drawing illustration...</div>\n".to_string()
        }
        None => {
            let mut html = "<div class=\"placeholder\">Image placeholder</div>\n".to_string();
            // 有描述却没有图片：只在屏幕上提示
            if section
                .image_description
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty())
            {
                html.push_str("<p class=\"hint no-print\">Failed to load image.</p>\n");
            }
            html
        }
    }
}

//! View rendering
//!
//! Plain format!-built HTML, no template engine. The pages are deliberately
//! small; everything interesting lives in the view-model structs the API
//! layer assembles before calling in here.

use std::collections::BTreeMap;

use crate::content::answers::Slot;
use crate::content::scanner::{Category, CourseTree, SectionResources};

/// Fully resolved per-section view-model.
pub struct SectionView {
    pub resources: SectionResources,
    pub discussions: Vec<String>,
    pub answers: Vec<(u32, Slot)>,
    /// Question slots keyed by the part folder they live in.
    pub questions: BTreeMap<&'static str, Vec<(u32, Slot)>>,
}

pub type ContentView = BTreeMap<String, BTreeMap<String, SectionView>>;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
<style>body{{font-family:sans-serif;max-width:960px;margin:0 auto;padding:1rem}}\
nav a{{margin-right:1rem}}ul{{margin:0.2rem 0}}\
.section{{border:1px solid #ddd;padding:0.5rem 1rem;margin:0.5rem 0}}</style></head><body>\
<nav><a href=\"/\">Home</a><a href=\"/course_description\">Description</a>\
<a href=\"/course_content\">Content</a><a href=\"/additional_resources\">Resources</a>\
<a href=\"/teaching_staff\">Staff</a><a href=\"/static\">Upload</a></nav>\
{body}</body></html>",
        title = escape(title),
        body = body
    )
}

pub fn index() -> String {
    page(
        "Course Portal",
        "<h1>Course Portal</h1>\
<p>Browse chapters and sections, join the discussions, and ask the AI assistant.</p>\
<h2>AI assistant</h2>\
<textarea id=\"q\" rows=\"3\" cols=\"60\" placeholder=\"Ask a question\"></textarea><br>\
<button onclick=\"ask()\">Ask</button><pre id=\"a\"></pre>\
<script>\
async function ask(){\
const out=document.getElementById('a');out.textContent='';\
const res=await fetch('/receive',{method:'POST',headers:{'Content-Type':'application/json'},\
body:JSON.stringify({messages:[{role:'user',content:document.getElementById('q').value}]})});\
const reader=res.body.getReader();const dec=new TextDecoder();\
for(;;){const{done,value}=await reader.read();if(done)break;\
for(const line of dec.decode(value).split('\\n')){\
if(!line.startsWith('data: '))continue;\
try{const ev=JSON.parse(line.slice(6));\
if(ev.error){out.textContent+='\\n[error] '+ev.error;break}\
out.textContent+=ev.choices[0].delta.content||''}catch(e){}}}}\
</script>",
    )
}

pub fn course_description() -> String {
    page(
        "Course Description",
        "<h1>Course Description</h1>\
<p>Lecture recordings, slides, exercises, and homework are organized by \
chapter and section under <a href=\"/course_content\">Course Content</a>.</p>",
    )
}

pub fn additional_resources() -> String {
    page(
        "Additional Resources",
        "<h1>Additional Resources</h1>\
<p>Supplementary readings and practice material are uploaded alongside the \
regular documents of each section.</p>",
    )
}

pub fn teaching_staff() -> String {
    page(
        "Teaching Staff",
        "<h1>Teaching Staff</h1>\
<p>Contact the teaching team through the discussion thread of the relevant \
section.</p>",
    )
}

fn render_slot(kind: &str, chapter: &str, section: &str, part: Option<&str>, n: u32, slot: &Slot) -> String {
    let mut out = format!("<li>{} {}", escape(kind), n);
    if let Some(image) = &slot.image {
        let href = match part {
            Some(part) => format!("/static/{}/{}/{}/{}", chapter, section, part, image),
            None => format!("/static/{}/{}/answers/{}", chapter, section, image),
        };
        out.push_str(&format!(" <a href=\"{}\">{}</a>", escape(&href), escape(image)));
    }
    if let Some(text) = &slot.text {
        out.push_str(&format!("<pre>{}</pre>", escape(text)));
    }
    out.push_str("</li>");
    out
}

fn render_section(chapter: &str, section: &str, view: &SectionView) -> String {
    let mut body = format!("<div class=\"section\"><h3>{}</h3>", escape(section));

    for category in Category::ALL {
        let files = view.resources.list(category);
        if files.is_empty() {
            continue;
        }
        body.push_str(&format!("<h4>{}</h4><ul>", category.label()));
        for file in files {
            let base = format!("{}/{}/{}/{}", chapter, section, category.dir_name(), file);
            body.push_str(&format!(
                "<li><a href=\"/static/{base}\">{name}</a> \
[<a href=\"/download/{base}\">download</a>] \
[<a href=\"/rename/{base}\">rename</a>] \
[<a href=\"/delete/{base}\">delete</a>]</li>",
                base = escape(&base),
                name = escape(file)
            ));
        }
        body.push_str("</ul>");
    }

    for (&part, slots) in &view.questions {
        body.push_str("<ul>");
        for (n, slot) in slots {
            body.push_str(&render_slot("Question", chapter, section, Some(part), *n, slot));
        }
        body.push_str("</ul>");
    }

    if !view.answers.is_empty() {
        body.push_str("<h4>Reference answers</h4><ul>");
        for (n, slot) in &view.answers {
            body.push_str(&render_slot("Answer", chapter, section, None, *n, slot));
        }
        body.push_str("</ul>");
    }

    body.push_str("<h4>Discussion</h4><ul>");
    for post in &view.discussions {
        body.push_str(&format!("<li>{}</li>", escape(post)));
    }
    body.push_str(&format!(
        "</ul><form method=\"post\" action=\"/submit_discussion/{}/{}\">\
<input name=\"discussion_content\" size=\"60\" placeholder=\"Add to the discussion\">\
<button type=\"submit\">Post</button></form></div>",
        escape(chapter),
        escape(section)
    ));

    body
}

pub fn course_content(view: &ContentView) -> String {
    let mut body = String::from("<h1>Course Content</h1>");
    if view.is_empty() {
        body.push_str("<p>No materials uploaded yet.</p>");
    }
    for (chapter, sections) in view {
        body.push_str(&format!("<h2>{}</h2>", escape(chapter)));
        for (section, section_view) in sections {
            body.push_str(&render_section(chapter, section, section_view));
        }
    }
    page("Course Content", &body)
}

pub fn upload_form(tree: &CourseTree) -> String {
    let mut body = String::from(
        "<h1>Upload</h1>\
<form method=\"post\" action=\"/static\" enctype=\"multipart/form-data\">\
<p><input type=\"file\" name=\"file\"></p>\
<p><input name=\"chapter\" placeholder=\"chapter\"> \
<input name=\"section\" placeholder=\"section\"> \
<select name=\"resource_type\">",
    );
    for category in Category::ALL {
        body.push_str(&format!(
            "<option value=\"{0}\">{0}</option>",
            category.dir_name()
        ));
    }
    body.push_str("</select></p><button type=\"submit\">Upload</button></form><h2>Existing chapters</h2><ul>");
    for (chapter, sections) in tree {
        body.push_str(&format!(
            "<li>{} ({} sections)</li>",
            escape(chapter),
            sections.len()
        ));
    }
    body.push_str("</ul>");
    page("Upload", &body)
}

pub fn rename_form(path: &str) -> String {
    let body = format!(
        "<h1>Rename</h1><p>{}</p>\
<form method=\"post\" action=\"/rename/{}\">\
<input name=\"new_name\" placeholder=\"new filename\">\
<button type=\"submit\">Rename</button></form>",
        escape(path),
        escape(path)
    );
    page("Rename", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_course_content_lists_discussions() {
        let mut view = ContentView::new();
        let section = SectionView {
            resources: SectionResources::default(),
            discussions: vec!["Hello".to_string()],
            answers: Vec::new(),
            questions: BTreeMap::new(),
        };
        view.entry("CH1".to_string())
            .or_default()
            .insert("S1".to_string(), section);

        let html = course_content(&view);
        assert!(html.contains("CH1"));
        assert!(html.contains("Hello"));
        assert!(html.contains("/submit_discussion/CH1/S1"));
    }
}

use man::prelude::*;
use std::path::Path;

fn main() {
    let page = Manual::new("glrfill")
        .about("fill a General Loss Report template from PDF inspection reports")
        .flag(
            Flag::new()
                .short("-p")
                .long("--plain")
                .help("Print the resolved mapping as plain JSON (no colors, no decorations)."),
        )
        .flag(Flag::new().long("--literal").help(
            "Treat the template text itself as the placeholders. The model returns \
             exact template substrings as keys; overlapping keys are resolved \
             longest-first.",
        ))
        .flag(Flag::new().long("--attach").help(
            "Send the evidence PDFs to the model as attachments instead of \
             extracting their text locally.",
        ))
        .flag(
            Flag::new()
                .long("--scan")
                .help("List the template's placeholders and exit without calling the model."),
        )
        .flag(
            Flag::new()
                .short("-h")
                .long("--help")
                .help("Show help information."),
        )
        .option(
            Opt::new("FILE")
                .short("-t")
                .long("--template")
                .help("The .docx template to fill."),
        )
        .option(
            Opt::new("FILE")
                .short("-o")
                .long("--output")
                .help("Where to write the filled document (default Completed_GLR.docx)."),
        )
        .option(
            Opt::new("KEY")
                .short("-k")
                .long("--api-key")
                .help("Gemini API key. Defaults to $GEMINI_API_KEY."),
        )
        .option(
            Opt::new("NAME")
                .short("-m")
                .long("--model")
                .help("Model identifier (default gemini-2.5-flash)."),
        )
        .option(
            Opt::new("SECS")
                .long("--timeout")
                .help("Upper bound on the model call in seconds (default 120)."),
        )
        .arg(Arg::new("[REPORT.pdf...]"))
        .custom(
            Section::new("description")
                .paragraph(
                    "glrfill reads a .docx report template and one or more PDF \
                     inspection reports, asks a language model to resolve every \
                     placeholder in a single call, and writes the completed \
                     document. Paragraph and table structure are preserved; only \
                     text changes.",
                )
                .paragraph(
                    "By default placeholders are tokens of the form \
                     \\fB[FIELD_NAME]\\fR (letters, digits, underscores). Fields \
                     the reports do not support are left empty.",
                )
                .paragraph(
                    "The placeholder list and resolved mapping are printed to \
                     stdout. When stdout is a terminal the mapping is \
                     pretty-printed as JSON via bat(1). Unreadable PDFs and \
                     unparsable model output are reported as warnings; the \
                     document is still produced. Maximum input size is 256 MiB.",
                ),
        )
        .example(
            Example::new()
                .text("Fill a template from two reports")
                .command("glrfill -t glr_template.docx photo_report.pdf inspection.pdf"),
        )
        .example(
            Example::new()
                .text("Show the fields a template asks for")
                .command("glrfill --scan -t glr_template.docx"),
        )
        .custom(
            Section::new("environment")
                .paragraph("\\fBGEMINI_API_KEY\\fR supplies the API key when -k is not given.")
                .paragraph(
                    "\\fBGLR_MODEL\\fR, \\fBGLR_API_BASE\\fR, \\fBGLR_TIMEOUT_SECS\\fR, \
                     \\fBGLR_PLACEHOLDERS\\fR (delimited or literal) and \
                     \\fBGLR_STRATEGY\\fR (text or attach) set defaults that \
                     command-line flags override.",
                )
                .paragraph("\\fBRUST_LOG\\fR controls diagnostic logging (default warn)."),
        )
        .custom(Section::new("see also").paragraph("bat(1), pdftotext(1)"))
        .render();

    // Write to OUT_DIR (standard cargo output directory)
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let out_path = Path::new(&out_dir).join("glrfill.1");
    std::fs::write(&out_path, &page).unwrap();

    // Also write to target/man/ so packaging scripts have a stable path
    // that doesn't depend on the hash-based OUT_DIR.
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let man_dir = Path::new(&manifest_dir).join("target").join("man");
    std::fs::create_dir_all(&man_dir).unwrap();
    std::fs::write(man_dir.join("glrfill.1"), &page).unwrap();

    println!("cargo::rerun-if-changed=build.rs");
}

//! License document generation.
//!
//! Produces the legally-worded license agreement a buyer receives after
//! payment, as plain text wrapped in a small self-contained PDF (Courier,
//! one content stream per page, offsets computed exactly). No drawing
//! library involved; output is deterministic for identical inputs, which the
//! golden tests rely on.

use crate::license::LicenseTier;

/// Everything the generator needs to know about one purchased line item.
#[derive(Debug, Clone)]
pub struct LicenseDocument<'a> {
    pub customer_name: &'a str,
    pub customer_email: &'a str,
    pub beat_title: &'a str,
    pub tier: LicenseTier,
    /// Public order reference printed on the document (the order id).
    pub order_reference: &'a str,
    /// Purchase date, preformatted (`YYYY-MM-DD`).
    pub date: &'a str,
    pub producer_name: &'a str,
}

const RULE: &str =
    "================================================================================";
const THIN_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Render the agreement as plain text.
pub fn license_text(doc: &LicenseDocument<'_>) -> String {
    let mut out = String::new();

    out.push_str(RULE);
    out.push_str("\n                         BEAT LICENSE AGREEMENT\n");
    out.push_str(RULE);
    out.push_str("\n\n");
    out.push_str(&format!("License ID: {}\n", doc.order_reference));
    out.push_str(&format!("Date: {}\n\n", doc.date));
    out.push_str(&format!("LICENSOR (Producer): {}\n", doc.producer_name));
    out.push_str(&format!(
        "LICENSEE: {} ({})\n\n",
        doc.customer_name, doc.customer_email
    ));
    out.push_str(&format!("BEAT: \"{}\"\n", doc.beat_title));
    out.push_str(&format!("LICENSE TYPE: {}\n\n", doc.tier));
    out.push_str(&tier_terms(doc));
    out.push('\n');
    out.push_str(THIN_RULE);
    out.push_str("\nGENERAL TERMS\n");
    out.push_str(THIN_RULE);
    out.push_str("\n\n");
    out.push_str(
        "1. This agreement becomes binding on completion of payment.\n\
         2. The Licensee may not resell, lease, or sublicense the beat itself.\n\
         3. The Licensee may not register the beat as their own composition\n\
         \x20  without written consent from the Licensor (Exclusive licenses\n\
         \x20  excepted).\n\
         4. Violation of these terms revokes the license with immediate effect.\n\
         5. This agreement is governed by applicable copyright law.\n\n",
    );
    out.push_str(RULE);
    out.push_str(
        "\nGenerated automatically upon purchase. This document serves as proof of license.\n",
    );
    out.push_str(RULE);
    out.push('\n');
    out
}

fn tier_terms(doc: &LicenseDocument<'_>) -> String {
    match doc.tier {
        LicenseTier::Basic => format!(
            "BASIC LEASE LICENSE\n\n\
             The Licensee is granted non-exclusive rights to use the beat\n\
             \"{title}\" under the following terms:\n\n\
             - Format: MP3 (320kbps)\n\
             - Distribution: up to 5,000 streams/downloads combined\n\
             - Commercial use: permitted with credit to the producer\n\
             - Exclusivity: non-exclusive; the producer retains ownership\n\
             - Modifications: the Licensee may add vocals and rearrange\n\
             - Credit: \"{producer}\" must be credited as the producer\n\n\
             Ownership of the underlying composition and master recording does\n\
             not transfer under this license.\n",
            title = doc.beat_title,
            producer = doc.producer_name,
        ),
        LicenseTier::Premium => format!(
            "PREMIUM LEASE LICENSE\n\n\
             The Licensee is granted non-exclusive rights to use the beat\n\
             \"{title}\" under the following terms:\n\n\
             - Format: MP3 (320kbps) + WAV (44.1kHz/24bit)\n\
             - Distribution: up to 50,000 streams/downloads combined\n\
             - Commercial use: permitted with credit to the producer\n\
             - Exclusivity: non-exclusive; the producer retains ownership\n\
             - Modifications: the Licensee may add vocals and rearrange\n\
             - Music videos: one (1) music video permitted\n\
             - Credit: \"{producer}\" must be credited as the producer\n\n\
             Ownership of the underlying composition and master recording does\n\
             not transfer under this license.\n",
            title = doc.beat_title,
            producer = doc.producer_name,
        ),
        LicenseTier::Exclusive => format!(
            "EXCLUSIVE RIGHTS LICENSE\n\n\
             The Licensee is granted EXCLUSIVE rights to use the beat\n\
             \"{title}\" under the following terms:\n\n\
             - Format: all available formats (MP3, WAV, stems if available)\n\
             - Distribution: unlimited streams/downloads\n\
             - Commercial use: fully permitted\n\
             - Exclusivity: exclusive; the beat is delisted from the store\n\
             - Ownership: full rights transfer to the Licensee\n\
             - Music videos: unlimited\n\
             - Credit: appreciated but not required\n\n\
             On execution of this agreement all rights to the beat transfer to\n\
             the Licensee.\n",
            title = doc.beat_title,
        ),
    }
}

/// Render the agreement as PDF bytes.
pub fn render_pdf(doc: &LicenseDocument<'_>) -> Vec<u8> {
    pdf_from_text(&license_text(doc))
}

// ---------------------------------------------------------------------------
// Minimal PDF container
// ---------------------------------------------------------------------------

/// Lines of 9pt Courier that fit one US-Letter page at our line step.
const LINES_PER_PAGE: usize = 50;
/// First baseline, measured from the page bottom.
const TOP_Y: i32 = 750;
/// Baseline-to-baseline distance.
const LINE_STEP: i32 = 14;

/// Wrap preformatted text in a paginated PDF.
///
/// Object layout: 1 = catalog, 2 = page tree, 3 = the Courier font, then a
/// (page, content-stream) object pair per page. The xref table carries real
/// byte offsets, so strict readers accept the file.
fn pdf_from_text(text: &str) -> Vec<u8> {
    let lines: Vec<&str> = text.lines().collect();
    let chunks: Vec<&[&str]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(LINES_PER_PAGE).collect()
    };
    let page_count = chunks.len();

    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = Vec::with_capacity(3 + 2 * page_count);
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{kids}] /Count {page_count} >>"
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Courier >>".to_string());

    for (i, chunk) in chunks.iter().enumerate() {
        let content_id = 5 + 2 * i;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));

        let mut stream = String::new();
        let mut y = TOP_Y;
        for line in *chunk {
            let escaped = escape_pdf_text(line);
            stream.push_str(&format!("BT /F1 9 Tf 50 {y} Td ({escaped}) Tj ET\n"));
            y -= LINE_STEP;
        }
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (idx, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{body}\nendobj\n", idx + 1));
    }

    let xref_offset = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));

    out.into_bytes()
}

/// Escape the characters PDF string literals reserve.
fn escape_pdf_text(line: &str) -> String {
    let mut escaped = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '(' => escaped.push_str("\\("),
            ')' => escaped.push_str("\\)"),
            _ => escaped.push(c),
        }
    }
    escaped
}

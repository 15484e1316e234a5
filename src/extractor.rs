//! Positioned text extraction from the roster PDF using lopdf
//!
//! Walks each page's content stream tracking the graphics and text matrices,
//! and emits one token per show-text operation. Tokens carry top-down y
//! coordinates (distance from the top page edge), which is the coordinate
//! system the column map is calibrated in.

use crate::RosterError;
use lopdf::{Document, Object, ObjectId};

/// Default page height when the MediaBox is missing (US Letter, points).
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// A text token with position information
#[derive(Debug, Clone)]
pub struct PositionedToken {
    /// The text content
    pub text: String,
    /// X position on page (left edge origin)
    pub x: f32,
    /// Distance from the top edge of the page
    pub top: f32,
    /// Page number (1-indexed)
    pub page: u32,
}

/// Extract positioned tokens from a single page, in content-stream order.
pub fn page_tokens(
    doc: &Document,
    page_id: ObjectId,
    page_num: u32,
) -> Result<Vec<PositionedToken>, RosterError> {
    use lopdf::content::Content;

    let mut tokens = Vec::new();
    let height = page_height(doc, page_id);

    // Fonts for encoding-aware text decode
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();

    let content_data = doc
        .get_page_content(page_id)
        .map_err(|e| RosterError::Pdf(e.to_string()))?;
    let content = Content::decode(&content_data).map_err(|e| RosterError::Pdf(e.to_string()))?;

    // Graphics state tracking
    let mut ctm = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut ctm_stack: Vec<[f32; 6]> = Vec::new();

    // Text state tracking
    let mut current_font = String::new();
    let mut current_font_size: f32 = 12.0;
    let mut text_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut line_matrix = [1.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
    let mut in_text_block = false;

    let mut emit = |text: String, text_matrix: &[f32; 6], ctm: &[f32; 6]| {
        if text.trim().is_empty() {
            return;
        }
        let combined = multiply_matrices(text_matrix, ctm);
        let (x, y) = (combined[4], combined[5]);
        tokens.push(PositionedToken {
            text,
            x,
            top: height - y,
            page: page_num,
        });
    };

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => {
                ctm_stack.push(ctm);
            }
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    ctm = saved;
                }
            }
            "cm" => {
                if op.operands.len() >= 6 {
                    let new_matrix = [
                        get_number(&op.operands[0]).unwrap_or(1.0),
                        get_number(&op.operands[1]).unwrap_or(0.0),
                        get_number(&op.operands[2]).unwrap_or(0.0),
                        get_number(&op.operands[3]).unwrap_or(1.0),
                        get_number(&op.operands[4]).unwrap_or(0.0),
                        get_number(&op.operands[5]).unwrap_or(0.0),
                    ];
                    ctm = multiply_matrices(&new_matrix, &ctm);
                }
            }
            "BT" => {
                in_text_block = true;
                text_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
                line_matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
            }
            "ET" => {
                in_text_block = false;
            }
            "Tf" => {
                if op.operands.len() >= 2 {
                    if let Ok(name) = op.operands[0].as_name() {
                        current_font = String::from_utf8_lossy(name).to_string();
                    }
                    if let Some(size) = get_number(&op.operands[1]) {
                        current_font_size = size;
                    }
                }
            }
            "Td" | "TD" => {
                if op.operands.len() >= 2 {
                    let tx = get_number(&op.operands[0]).unwrap_or(0.0);
                    let ty = get_number(&op.operands[1]).unwrap_or(0.0);
                    line_matrix[4] += tx;
                    line_matrix[5] += ty;
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if op.operands.len() >= 6 {
                    for (i, operand) in op.operands.iter().take(6).enumerate() {
                        text_matrix[i] =
                            get_number(operand).unwrap_or(if i == 0 || i == 3 { 1.0 } else { 0.0 });
                    }
                    line_matrix = text_matrix;
                }
            }
            "T*" => {
                // Approximate line height
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
            }
            "Tj" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Some(text) =
                        decode_text_operand(&op.operands[0], doc, &fonts, &current_font)
                    {
                        emit(text, &text_matrix, &ctm);
                    }
                }
            }
            "TJ" => {
                if in_text_block && !op.operands.is_empty() {
                    if let Ok(array) = op.operands[0].as_array() {
                        let mut combined_text = String::new();
                        for item in array {
                            if let Some(text) =
                                decode_text_operand(item, doc, &fonts, &current_font)
                            {
                                combined_text.push_str(&text);
                            }
                        }
                        emit(combined_text, &text_matrix, &ctm);
                    }
                }
            }
            "'" => {
                line_matrix[5] -= current_font_size * 1.2;
                text_matrix = line_matrix;
                if !op.operands.is_empty() {
                    if let Some(text) =
                        decode_text_operand(&op.operands[0], doc, &fonts, &current_font)
                    {
                        emit(text, &text_matrix, &ctm);
                    }
                }
            }
            _ => {}
        }
    }

    Ok(tokens)
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply_matrices(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

/// Helper to get f32 from Object
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Page height from the MediaBox, falling back to US Letter.
fn page_height(doc: &Document, page_id: ObjectId) -> f32 {
    doc.get_object(page_id)
        .ok()
        .and_then(|obj| obj.as_dict().ok())
        .and_then(|dict| dict.get(b"MediaBox").ok())
        .and_then(|obj| resolve(doc, obj).as_array().ok())
        .and_then(|media_box| media_box.get(3))
        .and_then(get_number)
        .unwrap_or(DEFAULT_PAGE_HEIGHT)
}

/// Follow a reference to its target object, or return the object itself.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Decode a text operand, handling font encoding
fn decode_text_operand(
    obj: &Object,
    doc: &Document,
    fonts: &std::collections::BTreeMap<Vec<u8>, &lopdf::Dictionary>,
    current_font: &str,
) -> Option<String> {
    if let Object::String(bytes, _) = obj {
        // Try to decode using font encoding
        if let Some(font_dict) = fonts.get(current_font.as_bytes()) {
            if let Ok(encoding) = font_dict.get_font_encoding(doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return Some(text);
                }
            }
        }

        // Fallback: try UTF-16BE then Latin-1
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let utf16: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect();
            return Some(String::from_utf16_lossy(&utf16));
        }

        // Latin-1 fallback
        Some(bytes.iter().map(|&b| b as char).collect())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_identity() {
        let id = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let m = [2.0, 0.0, 0.0, 2.0, 30.0, 40.0];
        assert_eq!(multiply_matrices(&m, &id), m);
        assert_eq!(multiply_matrices(&id, &m), m);
    }

    #[test]
    fn test_multiply_translation_composes() {
        let a = [1.0, 0.0, 0.0, 1.0, 10.0, 20.0];
        let b = [1.0, 0.0, 0.0, 1.0, 5.0, 7.0];
        let ab = multiply_matrices(&a, &b);
        assert_eq!(ab[4], 15.0);
        assert_eq!(ab[5], 27.0);
    }

    #[test]
    fn test_get_number() {
        assert_eq!(get_number(&Object::Integer(7)), Some(7.0));
        assert_eq!(get_number(&Object::Real(1.5)), Some(1.5));
        assert_eq!(get_number(&Object::Null), None);
    }
}

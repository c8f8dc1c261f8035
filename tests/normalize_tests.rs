use vnpdf_to_txt::normalize::fix_quote_spacing;
use vnpdf_to_txt::{Normalizer, PipelineConfig, UnicodeForm};

fn normalizer() -> Normalizer {
    Normalizer::new(&PipelineConfig::default())
}

#[test]
fn empty_and_blank_lines_are_dropped() {
    let n = normalizer();
    assert_eq!(n.clean_string(""), "");
    assert_eq!(n.clean_string("   \t "), "");
    assert_eq!(n.clean_string("• _ ●"), "");
}

#[test]
fn leading_bullets_and_garbage_are_removed() {
    let n = normalizer();
    assert_eq!(n.clean_string("• Miệt vườn Watermark xưa"), "Miệt vườn  xưa");
    assert_eq!(n.clean_string("_ Tủ sách Văn hóa"), "Văn hóa");
    assert_eq!(n.clean_string("WaterWatermarkmark dòng"), "dòng");
}

#[test]
fn punctuation_is_pulled_against_the_word() {
    let n = normalizer();
    assert_eq!(n.clean_string("Vườn , ruộng ; sông ."), "Vườn, ruộng; sông.");
    assert_eq!(n.clean_string("Thật sao ?"), "Thật sao?");
}

#[test]
fn detached_footnote_is_reattached() {
    let n = normalizer();
    assert_eq!(n.clean_string("miệt vườn [2] xưa"), "miệt vườn[2] xưa");
}

#[test]
fn curly_quote_spacing_is_repaired() {
    let n = normalizer();
    assert_eq!(n.clean_string("gọi là“ Ra đi ”nhé"), "gọi là “Ra đi” nhé");
    assert_eq!(n.clean_string("(“Ra đi”)"), "(“Ra đi”)");
}

#[test]
fn straight_quotes_pair_up() {
    assert_eq!(fix_quote_spacing(r#"ông nói" xin chào "rồi đi"#), r#"ông nói "xin chào" rồi đi"#);
    assert_eq!(fix_quote_spacing(r#""Đầu dòng" thôi"#), r#""Đầu dòng" thôi"#);
    assert_eq!(fix_quote_spacing(r#"("trong ngoặc")"#), r#"("trong ngoặc")"#);
}

#[test]
fn leading_parenthesised_title_moves_to_its_own_line() {
    let n = normalizer();
    assert_eq!(n.clean_string("(Tựa đề) Nội dung tiếp theo"), "(Tựa đề)\nNội dung tiếp theo");
}

#[test]
fn compatibility_forms_are_folded_with_nfkc() {
    let n = normalizer();
    // U+FB01 ligature and a decomposed "ờ"
    assert_eq!(n.clean_string("\u{FB01}le Tro\u{31B}\u{300}i"), "file Trời");

    let cfg = PipelineConfig { unicode_form: UnicodeForm::Nfc, ..PipelineConfig::default() };
    let nfc = Normalizer::new(&cfg);
    assert_eq!(nfc.clean_string("\u{FB01}le"), "\u{FB01}le");
}

#[test]
fn normalization_is_idempotent() {
    let n = normalizer();
    let samples = [
        "  • Đồng bằng sông Cửu Long , nét sinh hoạt xưa .",
        "gọi là“ Ra đi ”nhé, \"xin\"chào",
        "(Tựa đề) . Nội dung [1] tiếp",
        "Ebook miễn phí tại hoccachlamgiau",
        "Ể \"x\" Ồ Ằ ",
        "a\"\"b \" c \" d",
        "WaterWatermarkmark•dòng ; chữ",
        "“ ” ( \" ) ?",
        "___",
        "(a)(b) c",
    ];
    for sample in samples {
        let once = n.clean_string(sample);
        let twice = n.clean_string(&once);
        assert_eq!(once, twice, "not idempotent for {:?}", sample);
    }
}

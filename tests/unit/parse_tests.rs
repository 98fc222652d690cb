// Parser tests: request paths decoded into Params

use imagepath::path::{apply, parse, Filter, HAlign, Params, TrimAnchor, VAlign};
use rstest::rstest;

fn full_program(path: &str) -> Params {
    Params {
        canonical_path: path.to_string(),
        image: "img".to_string(),
        meta: true,
        trim: true,
        trim_anchor: TrimAnchor::TopLeft,
        crop_left: 10.0,
        crop_top: 11.0,
        crop_right: 12.0,
        crop_bottom: 13.0,
        fit_in: true,
        width: 300,
        height: 200,
        h_flip: true,
        v_flip: true,
        h_align: HAlign::Left,
        v_align: VAlign::Top,
        smart: true,
        filters: vec![Filter::new("some_filter", "")],
        ..Default::default()
    }
}

#[test]
fn test_parse_every_segment() {
    let path = "meta/trim/10x11:12x13/fit-in/-300x-200/left/top/smart/filters:some_filter()/img";
    assert_eq!(parse(path), full_program(path));
}

#[test]
fn test_parse_url_image_with_trim_tolerance() {
    let path = "meta/trim:100/10x11:12x13/fit-in/-300x-200/left/top/smart/filters:some_filter()/s.glbimg.com/es/ge/f/original/2011/03/29/orlandosilva_60.jpg";
    let expected = Params {
        image: "s.glbimg.com/es/ge/f/original/2011/03/29/orlandosilva_60.jpg".to_string(),
        trim_tolerance: 100,
        ..full_program(path)
    };
    assert_eq!(parse(path), expected);
}

#[test]
fn test_parse_signed_path() {
    let params = parse(
        "VTAq7YIRbEXgtwAcsTMhAjvBuT8=/meta/10x11:12x13/fit-in/-300x-200/5x6/left/top/smart/filters:some_filter()/img",
    );
    let canonical = "meta/10x11:12x13/fit-in/-300x-200/5x6/left/top/smart/filters:some_filter()/img";
    let expected = Params {
        signature: "VTAq7YIRbEXgtwAcsTMhAjvBuT8=".to_string(),
        trim: false,
        padding_left: 5,
        padding_top: 6,
        padding_right: 5,
        padding_bottom: 6,
        ..full_program(canonical)
    };
    assert_eq!(params, expected);
}

#[test]
fn test_parse_crop_by_fraction_keeps_literal_values() {
    let params = parse("meta/trim/0.2x0.15:0.45x0.67/fit-in/-300x-200/left/top/smart/filters:some_filter()/img");
    assert_eq!(params.crop_left, 0.2);
    assert_eq!(params.crop_top, 0.15);
    assert_eq!(params.crop_right, 0.45);
    assert_eq!(params.crop_bottom, 0.67);
}

#[test]
fn test_parse_unsafe_without_params() {
    let params = parse("unsafe/https://thumbor.readthedocs.io/en/latest/_images/man_before_sharpen.png");
    assert!(params.is_unsafe);
    assert!(params.signature.is_empty());
    assert_eq!(
        params.canonical_path,
        "https://thumbor.readthedocs.io/en/latest/_images/man_before_sharpen.png"
    );
    assert_eq!(params.image, params.canonical_path);
}

#[test]
fn test_parse_padding_without_dimensions() {
    let params = parse(
        "unsafe/fit-in/0x0/5x6:7x8/https://thumbor.readthedocs.io/en/latest/_images/man_before_sharpen.png",
    );
    assert!(params.fit_in);
    assert_eq!((params.width, params.height), (0, 0));
    assert_eq!(
        (
            params.padding_left,
            params.padding_top,
            params.padding_right,
            params.padding_bottom
        ),
        (5, 6, 7, 8)
    );
}

#[test]
fn test_parse_multiple_filters() {
    let params = parse(
        "filters:watermark(s.glbimg.com/es/ge/f/original/2011/03/29/orlandosilva_60.jpg,0,0,0):brightness(-50):grayscale()/img",
    );
    assert_eq!(
        params.filters,
        vec![
            Filter::new(
                "watermark",
                "s.glbimg.com/es/ge/f/original/2011/03/29/orlandosilva_60.jpg,0,0,0"
            ),
            Filter::new("brightness", "-50"),
            Filter::new("grayscale", ""),
        ]
    );
    assert_eq!(params.image, "img");
}

#[test]
fn test_parse_url_in_filter_args() {
    let params = parse(
        "unsafe/stretch/500x350/filters:watermark(http://thumborize.me/static/img/beach.jpg,100,100,50)/http://thumborize.me/static/img/beach.jpg",
    );
    assert!(params.stretch);
    assert_eq!((params.width, params.height), (500, 350));
    assert_eq!(
        params.filters,
        vec![Filter::new(
            "watermark",
            "http://thumborize.me/static/img/beach.jpg,100,100,50"
        )]
    );
    assert_eq!(params.image, "http://thumborize.me/static/img/beach.jpg");
}

#[test]
fn test_parse_nested_filter_chain_is_opaque() {
    let params = parse(
        "unsafe/fit-in/200x150/filters:watermark(fit-in/50x50/filters:label(hello,10,10,20,red):watermark(logo.png,0,0,0)/gopher.png,repeat,bottom,10):format(jpeg)/img.png",
    );
    assert_eq!(
        params.filters,
        vec![
            Filter::new(
                "watermark",
                "fit-in/50x50/filters:label(hello,10,10,20,red):watermark(logo.png,0,0,0)/gopher.png,repeat,bottom,10"
            ),
            Filter::new("format", "jpeg"),
        ]
    );
    assert_eq!(params.image, "img.png");
}

#[test]
fn test_filter_names_lowercased_args_verbatim() {
    let params = parse("filters:Fill(White):QUALITY(80)/img");
    assert_eq!(
        params.filters,
        vec![Filter::new("fill", "White"), Filter::new("quality", "80")]
    );
}

#[test]
fn test_params_prefix_marks_meta_request() {
    let params = parse("/params/unsafe/10x10/img.jpg");
    assert!(params.is_meta_request);
    assert!(params.is_unsafe);
    assert_eq!(params.canonical_path, "10x10/img.jpg");
}

#[test]
fn test_no_marker_keeps_whole_path_canonical() {
    let params = parse("fit-in/10x10/img.jpg");
    assert!(params.is_internal());
    assert_eq!(params.canonical_path, "fit-in/10x10/img.jpg");
}

#[test]
fn test_leading_dimensions_read_as_signature_without_marker() {
    let params = parse("1000x1000/img");
    assert_eq!(params.signature, "1000x1000");
    assert_eq!((params.width, params.height), (0, 0));
    assert_eq!(params.canonical_path, "img");
    assert_eq!(params.image, "img");
}

#[test]
fn test_eight_character_token_is_not_a_signature() {
    let params = parse("abcdefgh/img.jpg");
    assert!(params.signature.is_empty());
    assert_eq!(params.canonical_path, "abcdefgh/img.jpg");
    assert_eq!(params.image, "abcdefgh/img.jpg");
}

/// Images are query-unescaped as a whole, or kept raw when any escape is
/// malformed
#[rstest]
#[case("unsafe/a%20b%3Fc.jpg", "a b?c.jpg")]
#[case("unsafe/gopher+.png", "gopher .png")]
#[case("unsafe/a%2Bb.jpg", "a+b.jpg")]
#[case("unsafe/a%zzb%20c", "a%zzb%20c")]
#[case("unsafe/bad%FF.jpg", "bad%FF.jpg")]
#[case("unsafe/50%", "50%")]
fn test_image_unescaping(#[case] path: &str, #[case] image: &str) {
    assert_eq!(parse(path).image, image);
}

#[test]
fn test_base64_image() {
    let params = parse("unsafe/fit-in/b64:aGVsbG8uanBn");
    assert_eq!(params.image, "hello.jpg");
    assert!(params.base64_image);
}

#[test]
fn test_line_breaks_stripped() {
    let params = parse("unsafe/fit-in/\r\n10x20/\nimg.jpg");
    assert!(params.fit_in);
    assert_eq!((params.width, params.height), (10, 20));
    assert_eq!(params.canonical_path, "fit-in/10x20/img.jpg");
}

/// Segments are positional: each is only recognised in its slot, anything
/// out of order is absorbed into the image.
#[rstest]
#[case("fit-in/meta/img", "meta/img")]
#[case("smart/left/img", "left/img")]
#[case("10x10/fit-in/img", "fit-in/img")]
#[case("top/left/img", "left/img")]
#[case("filters:blur(1)/smart/img", "smart/img")]
#[case("center/img", "center/img")]
#[case("trim:center/img", "trim:center/img")]
#[case("filters:format(webp)", "filters:format(webp)")]
#[case("filters:blur(1/img", "filters:blur(1/img")]
fn test_out_of_order_segments_fall_into_image(#[case] path: &str, #[case] image: &str) {
    assert_eq!(parse(path).image, image);
}

#[rstest]
#[case("10x20/img", false, 10, false, 20)]
#[case("-10x20/img", true, 10, false, 20)]
#[case("10x-20/img", false, 10, true, 20)]
#[case("-x-/img", true, 0, true, 0)]
#[case("x300/img", false, 0, false, 300)]
#[case("unsafe/99999999999x1/img", false, 0, false, 1)]
fn test_dimension_shapes(
    #[case] path: &str,
    #[case] h_flip: bool,
    #[case] width: i32,
    #[case] v_flip: bool,
    #[case] height: i32,
) {
    let params = parse(path);
    assert_eq!(
        (params.h_flip, params.width, params.v_flip, params.height),
        (h_flip, width, v_flip, height)
    );
    assert_eq!(params.image, "img");
}

#[rstest]
#[case("trim/img", TrimAnchor::TopLeft, 0)]
#[case("trim:top-left/img", TrimAnchor::TopLeft, 0)]
#[case("trim:bottom-right/img", TrimAnchor::BottomRight, 0)]
#[case("trim:50/img", TrimAnchor::TopLeft, 50)]
#[case("trim:bottom-right:50/img", TrimAnchor::BottomRight, 50)]
fn test_trim_shapes(#[case] path: &str, #[case] anchor: TrimAnchor, #[case] tolerance: i32) {
    let params = parse(path);
    assert!(params.trim);
    assert_eq!(params.trim_anchor, anchor);
    assert_eq!(params.trim_tolerance, tolerance);
    assert_eq!(params.image, "img");
}

#[test]
fn test_apply_overlays_base() {
    let base = Params {
        width: 100,
        height: 100,
        smart: true,
        filters: vec![Filter::new("format", "webp")],
        ..Default::default()
    };
    let params = apply(base, "unsafe/200x0/filters:blur(2)/img.jpg");
    assert_eq!((params.width, params.height), (200, 0));
    assert!(params.smart);
    assert_eq!(
        params.filters,
        vec![Filter::new("format", "webp"), Filter::new("blur", "2")]
    );
    assert_eq!(params.image, "img.jpg");
    assert_eq!(params.canonical_path, "200x0/filters:blur(2)/img.jpg");
}

#[test]
fn test_parse_is_apply_on_default() {
    let path = "unsafe/trim/fit-in/10x10/filters:blur(1)/a.jpg";
    assert_eq!(parse(path), apply(Params::default(), path));
    assert_eq!(path.parse::<Params>().unwrap(), parse(path));
}

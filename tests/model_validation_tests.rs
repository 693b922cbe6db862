use axum::response::IntoResponse;
use axum::http::{StatusCode, header};
use series_catalog::{
    models::{Book, Series, SeriesForm, SeriesInput, SeriesSearch},
    views::{Notice, Outcome, SeriesDraft, SeriesFormView, View},
};
use uuid::Uuid;

fn form(name: &str, access_level: &str) -> SeriesForm {
    SeriesForm {
        name: name.to_string(),
        access_level: access_level.to_string(),
    }
}

#[test]
fn test_form_coerces_access_level_from_string() {
    let input = form("  Dune ", " 2 ").parse().unwrap();
    assert_eq!(
        input,
        SeriesInput {
            name: "Dune".to_string(),
            access_level: 2
        }
    );
}

#[test]
fn test_form_rejects_blank_name_and_non_integer_level() {
    assert!(form("", "1").parse().is_err());
    assert!(form("Dune", "").parse().is_err());
    assert!(form("Dune", "1.5").parse().is_err());
    assert!(form("Dune", "one").parse().is_err());
}

#[test]
fn test_visibility_comparison_direction() {
    let series = Series {
        id: Uuid::new_v4(),
        name: "Restricted".to_string(),
        access_level: 2,
    };
    // Higher reader levels unlock more; equal is enough.
    assert!(!series.is_visible_to(1));
    assert!(series.is_visible_to(2));
    assert!(series.is_visible_to(3));
}

#[test]
fn test_blank_search_is_no_filter() {
    let blank = SeriesSearch {
        name: Some(String::new()),
    };
    let set = SeriesSearch {
        name: Some("dune".to_string()),
    };
    assert_eq!(blank.name_filter(), None);
    assert_eq!(SeriesSearch::default().name_filter(), None);
    assert_eq!(set.name_filter(), Some("dune"));
}

#[test]
fn test_form_field_uses_camel_case_access_level() {
    let parsed: SeriesForm = serde_json::from_str(r#"{"name":"Dune","accessLevel":"3"}"#).unwrap();
    assert_eq!(parsed.access_level, "3");
}

#[test]
fn test_json_access_level_may_be_a_number() {
    let parsed: SeriesForm = serde_json::from_str(r#"{"name":"Dune","accessLevel":3}"#).unwrap();
    assert_eq!(parsed.access_level, "3");
    assert_eq!(parsed.parse().unwrap().access_level, 3);

    let fractional: SeriesForm =
        serde_json::from_str(r#"{"name":"Dune","accessLevel":2.5}"#).unwrap();
    assert!(fractional.parse().is_err());
}

#[test]
fn test_book_serializes_series_reference_as_series() {
    let book = Book {
        id: Uuid::new_v4(),
        title: "Dune".to_string(),
        series_id: None,
        series_index: 1,
        access_level: 0,
    };

    let json = serde_json::to_value(&book).unwrap();
    assert!(json.get("series").is_some());
    assert_eq!(json["seriesIndex"], 1);
    assert!(json.get("series_id").is_none());
}

#[test]
fn test_view_serializes_template_and_locals() {
    let view = View::SeriesNew(SeriesFormView {
        series: SeriesDraft {
            id: None,
            name: "Foo".to_string(),
            access_level: "x".to_string(),
        },
        notice: Some(Notice::error("Error creating series")),
    });

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["template"], "series/new");
    assert_eq!(json["locals"]["series"]["accessLevel"], "x");
    assert_eq!(json["locals"]["notice"]["kind"], "error");
}

#[test]
fn test_redirect_outcome_is_see_other() {
    let response = Outcome::redirect("/series").into_response();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/series");
}

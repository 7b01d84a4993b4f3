use intl_extract::config::ExtractionConfig;
use intl_extract::extractor::{extract_from_source, FileExtraction};
use std::path::Path;

fn extract(source: &str) -> FileExtraction {
    let config = ExtractionConfig::default();
    extract_from_source(source, Path::new("a.jsx"), &config).unwrap()
}

fn has_message(extraction: &FileExtraction, id: &str, default_message: &str) -> bool {
    extraction
        .messages
        .iter()
        .any(|m| m.id == id && m.default_message == default_message)
}

#[test]
fn pattern_formatted_message_component() {
    let extraction = extract(
        "import { FormattedMessage } from 'react-intl';\n\
         const el = <FormattedMessage id=\"home.title\" defaultMessage=\"Welcome\" />;",
    );
    assert!(has_message(&extraction, "home.title", "Welcome"));
}

#[test]
fn pattern_formatted_html_message_component() {
    let extraction = extract(
        "import { FormattedHTMLMessage } from 'react-intl';\n\
         const el = <FormattedHTMLMessage id=\"home.body\" defaultMessage=\"<b>Hi</b>\" />;",
    );
    assert!(has_message(&extraction, "home.body", "<b>Hi</b>"));
}

#[test]
fn pattern_define_messages_call() {
    let extraction = extract(
        "import { defineMessages } from 'react-intl';\n\
         const messages = defineMessages({\n\
           title: { id: 'home.title', defaultMessage: 'Welcome' },\n\
           body: { id: 'home.body', defaultMessage: 'Enjoy your stay' },\n\
         });",
    );
    assert!(has_message(&extraction, "home.title", "Welcome"));
    assert!(has_message(&extraction, "home.body", "Enjoy your stay"));
}

#[test]
fn pattern_expression_container_value() {
    let extraction = extract(
        "import { FormattedMessage } from 'react-intl';\n\
         const el = <FormattedMessage id={'home.' + 'title'} defaultMessage={`Welcome`} />;",
    );
    assert!(has_message(&extraction, "home.title", "Welcome"));
}

#[test]
fn pattern_namespace_member_usage() {
    let extraction = extract(
        "import * as Intl from 'react-intl';\n\
         const el = <Intl.FormattedMessage id=\"a\" defaultMessage=\"Hi\" />;\n\
         const m = Intl.defineMessages({ b: { id: 'b', defaultMessage: 'Yo' } });",
    );
    assert!(has_message(&extraction, "a", "Hi"));
    assert!(has_message(&extraction, "b", "Yo"));
}

#[test]
fn pattern_extra_attributes_are_ignored() {
    let extraction = extract(
        "import { FormattedMessage } from 'react-intl';\n\
         const el = <FormattedMessage id=\"a\" defaultMessage=\"Hi\" tagName=\"p\" values={{ n: 1 }} />;",
    );
    assert!(has_message(&extraction, "a", "Hi"));
    assert!(extraction.rewritten.contains("tagName=\"p\""));
}

#[test]
fn pattern_structured_description() {
    let extraction = extract(
        "import { defineMessages } from 'react-intl';\n\
         const m = defineMessages({\n\
           a: { id: 'a', description: { context: 'header' }, defaultMessage: 'Hi' },\n\
         });",
    );
    let description = extraction.messages[0].description.as_ref().unwrap();
    assert_eq!(description["context"], "header");
}

#[test]
fn pattern_plural_message_validates() {
    let extraction = extract(
        "import { FormattedMessage } from 'react-intl';\n\
         const el = (\n\
           <FormattedMessage\n\
             id=\"cart.items\"\n\
             defaultMessage=\"{count, plural, one {# item} other {# items}}\"\n\
           />\n\
         );",
    );
    assert!(has_message(
        &extraction,
        "cart.items",
        "{count, plural, one {# item} other {# items}}"
    ));
}

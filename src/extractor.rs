use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use glob::Pattern;
use serde_json::Value;
use swc_common::sync::Lrc;
use swc_common::{BytePos, FileName, SourceMap, Span, Spanned};
use swc_ecma_ast::{
    ArrowExpr, CallExpr, Callee, Expr, FnDecl, Function, ImportDecl, ImportSpecifier, JSXAttrName,
    JSXAttrOrSpread, JSXAttrValue, JSXElement, JSXElementName, JSXExpr, Module, ModuleExportName,
    ObjectLit, ObjectPatProp, Pat, Prop, PropName, PropOrSpread, Str, VarDecl, VarDeclKind,
};
use swc_ecma_parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use swc_ecma_visit::{Visit, VisitWith};

use crate::config::ExtractionConfig;
use crate::descriptor::{
    DescriptorDraft, InsertError, MessageDescriptor, MessageTable, SourceLocation,
};
use crate::error::{ExtractError, Position, JSX_ESCAPE_HINT};
use crate::evaluator::{prop_name_text, StaticEnv};
use crate::icu;
use crate::logging;
use crate::manifest::METADATA_KEY;
use crate::rewrite::{self, SourceEdit};

/// Components whose inline usage defines an extractable message.
const MARKER_COMPONENTS: [&str; 2] = ["FormattedMessage", "FormattedHTMLMessage"];

/// Recognized but unsupported: plurals carry their messages in child render
/// props, which are never statically extractable.
const UNSUPPORTED_MARKER: &str = "FormattedPlural";

/// The batch-definition call.
const DEFINE_MESSAGES: &str = "defineMessages";

/// Everything extracted from one source file.
#[derive(Debug)]
pub struct FileExtraction {
    /// Working-directory-relative display path
    pub file: String,
    /// Descriptors in source order
    pub messages: Vec<MessageDescriptor>,
    /// Source text with translator-only data stripped
    pub rewritten: String,
    /// Whether `rewritten` differs from the input
    pub changed: bool,
    pub warning_count: usize,
}

impl FileExtraction {
    /// Metadata side-channel for the surrounding build pipeline: the ordered
    /// descriptor sequence under its fixed key, populated whether or not a
    /// manifest file is written.
    pub fn metadata(&self) -> (&'static str, &[MessageDescriptor]) {
        (METADATA_KEY, &self.messages)
    }
}

/// Error encountered while extracting from one file
#[derive(Debug, Clone)]
pub struct ExtractionError {
    pub file_path: String,
    pub message: String,
}

/// Result of extraction from multiple files
#[derive(Debug, Default)]
pub struct ExtractionResult {
    pub files: Vec<FileExtraction>,
    pub warning_count: usize,
    pub errors: Vec<ExtractionError>,
}

// =============================================================================
// Import bindings
// =============================================================================

/// Tracks which local names are bound to the configured module's exports.
///
/// Matching is by binding provenance, never by bare name: an identifier only
/// resolves if it was imported from `module_source` and has not been shadowed
/// by a closer declaration. Shadowing is tracked with a scope stack pushed on
/// every function and arrow body.
#[derive(Debug)]
struct ImportBindings {
    module_source: String,
    named: HashMap<String, String>,
    namespaces: HashSet<String>,
    shadowed: Vec<HashSet<String>>,
}

impl ImportBindings {
    fn new(module_source: &str) -> Self {
        Self {
            module_source: module_source.to_string(),
            named: HashMap::new(),
            namespaces: HashSet::new(),
            shadowed: vec![HashSet::new()],
        }
    }

    fn collect(&mut self, import: &ImportDecl) {
        let Some(source) = import.src.value.as_str() else {
            return;
        };
        if source != self.module_source {
            return;
        }
        for specifier in &import.specifiers {
            match specifier {
                ImportSpecifier::Named(named) => {
                    let local = named.local.sym.to_string();
                    let imported = match named.imported.as_ref() {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                        Some(ModuleExportName::Str(s)) => match s.value.as_str() {
                            Some(name) => name.to_string(),
                            None => continue,
                        },
                        None => local.clone(),
                    };
                    self.named.insert(local, imported);
                }
                ImportSpecifier::Namespace(ns) => {
                    self.namespaces.insert(ns.local.sym.to_string());
                }
                ImportSpecifier::Default(_) => {}
            }
        }
    }

    fn enter_scope(&mut self) {
        self.shadowed.push(HashSet::new());
    }

    fn exit_scope(&mut self) {
        if self.shadowed.len() > 1 {
            self.shadowed.pop();
        }
    }

    /// Record a declaration that hides an import for the current scope.
    fn shadow(&mut self, name: &str) {
        if !self.named.contains_key(name) && !self.namespaces.contains(name) {
            return;
        }
        if let Some(scope) = self.shadowed.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn is_shadowed(&self, name: &str) -> bool {
        self.shadowed.iter().any(|scope| scope.contains(name))
    }

    /// Resolve a local identifier to the export it was imported as.
    fn resolve(&self, local: &str) -> Option<&str> {
        if self.is_shadowed(local) {
            return None;
        }
        self.named.get(local).map(String::as_str)
    }

    /// True if `local` is a namespace import of the module.
    fn resolve_namespace(&self, local: &str) -> bool {
        self.namespaces.contains(local) && !self.is_shadowed(local)
    }
}

// =============================================================================
// Descriptor field collection (the two syntactic shapes)
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum FieldValue<'a> {
    /// JSX string-literal attribute value; remembered for the escaping hint
    JsxString(&'a Str),
    Expr(&'a Expr),
    /// Shorthand object property ({ id }) resolved through the const env
    Shorthand(&'a str),
    /// Key present but no statically usable value node
    Missing,
}

#[derive(Debug, Clone, Copy)]
struct CollectedField<'a> {
    value: FieldValue<'a>,
    /// The whole attribute/property node, for removal
    node_span: Span,
    /// The value node, for diagnostics
    value_span: Span,
}

/// The builder output before evaluation: which of the fixed descriptor keys
/// are present, and which nodes they came from. Keys outside the fixed set
/// are silently ignored, so spread and computed extra props pass through.
#[derive(Debug, Default, Clone, Copy)]
struct FieldMap<'a> {
    id: Option<CollectedField<'a>>,
    description: Option<CollectedField<'a>>,
    default_message: Option<CollectedField<'a>>,
}

impl<'a> FieldMap<'a> {
    fn record(&mut self, key: &str, field: CollectedField<'a>) {
        match key {
            "id" => self.id = Some(field),
            "description" => self.description = Some(field),
            "defaultMessage" => self.default_message = Some(field),
            _ => {}
        }
    }
}

fn collect_jsx_fields(attrs: &[JSXAttrOrSpread]) -> FieldMap<'_> {
    let mut fields = FieldMap::default();
    for attr in attrs {
        let JSXAttrOrSpread::JSXAttr(attr) = attr else {
            continue;
        };
        let JSXAttrName::Ident(name) = &attr.name else {
            continue;
        };
        let (value, value_span) = match attr.value.as_ref() {
            Some(JSXAttrValue::Str(s)) => (FieldValue::JsxString(s), s.span),
            Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                JSXExpr::Expr(expr) => (FieldValue::Expr(expr), expr.span()),
                JSXExpr::JSXEmptyExpr(_) => (FieldValue::Missing, container.span),
            },
            Some(other) => (FieldValue::Missing, other.span()),
            None => (FieldValue::Missing, attr.span),
        };
        fields.record(
            name.sym.as_ref(),
            CollectedField {
                value,
                node_span: attr.span,
                value_span,
            },
        );
    }
    fields
}

// =============================================================================
// The per-file walk
// =============================================================================

/// Single-pass visitor over one file's tree. Both pattern matchers check the
/// processed-span side table first, so walking an already-rewritten tree a
/// second time extracts and mutates nothing.
struct MessageVisitor<'a> {
    config: &'a ExtractionConfig,
    source_map: Lrc<SourceMap>,
    source: &'a str,
    file_start: BytePos,
    file_path: String,
    bindings: ImportBindings,
    env: StaticEnv,
    table: MessageTable,
    edits: Vec<SourceEdit>,
    processed: HashSet<BytePos>,
    warning_count: usize,
    fatal: Option<ExtractError>,
}

impl<'a> MessageVisitor<'a> {
    fn new(
        config: &'a ExtractionConfig,
        source_map: Lrc<SourceMap>,
        source: &'a str,
        file_start: BytePos,
        file_path: String,
    ) -> Self {
        Self {
            config,
            source_map,
            source,
            file_start,
            file_path,
            bindings: ImportBindings::new(&config.module_source_name),
            env: StaticEnv::new(),
            table: MessageTable::new(
                config.optional_default_messages,
                config.enforce_descriptions,
            ),
            edits: Vec::new(),
            processed: HashSet::new(),
            warning_count: 0,
            fatal: None,
        }
    }

    fn position(&self, span: Span) -> Position {
        Position::from_span(&self.source_map, span)
    }

    fn warn(&mut self, message: &str) {
        self.warning_count += 1;
        logging::warn(&format!("{}:{}", self.file_path, message));
    }

    /// Fatal by default; under errorsAsWarnings the message is skipped and
    /// the walk continues.
    fn report(&mut self, error: ExtractError) {
        if self.config.errors_as_warnings {
            let text = error.to_string();
            self.warn(&text);
        } else if self.fatal.is_none() {
            self.fatal = Some(error);
        }
    }

    fn location(&self, span: Span) -> Option<SourceLocation> {
        if !self.config.extract_source_location {
            return None;
        }
        let pos = self.position(span);
        Some(SourceLocation {
            file: self.file_path.clone(),
            line: pos.line,
            column: pos.column,
        })
    }

    fn not_static(&self, span: Span) -> ExtractError {
        ExtractError::NotStaticallyEvaluable {
            pos: self.position(span),
        }
    }

    // -------------------------------------------------------------------------
    // Field evaluation
    // -------------------------------------------------------------------------

    /// Evaluate one collected field. The bool reports whether the value was a
    /// JSX string literal whose raw text contains a backslash (the case the
    /// ICU escaping hint exists for).
    fn evaluate_field(&self, field: &CollectedField) -> Result<(Value, bool), ExtractError> {
        match field.value {
            FieldValue::JsxString(s) => {
                let text = s
                    .value
                    .as_str()
                    .ok_or_else(|| self.not_static(field.value_span))?;
                let backslash = s.raw.as_ref().is_some_and(|raw| raw.contains('\\'));
                Ok((Value::String(text.to_string()), backslash))
            }
            FieldValue::Expr(expr) => self
                .env
                .evaluate(expr)
                .map(|value| (value, false))
                .ok_or_else(|| self.not_static(field.value_span)),
            FieldValue::Shorthand(name) => self
                .env
                .lookup(name)
                .cloned()
                .map(|value| (value, false))
                .ok_or_else(|| self.not_static(field.value_span)),
            FieldValue::Missing => Err(self.not_static(field.value_span)),
        }
    }

    /// Resolve all collected fields into a draft. String values are trimmed;
    /// the returned flag marks a backslashed JSX-literal defaultMessage.
    fn build_draft(&self, fields: &FieldMap) -> Result<(DescriptorDraft, bool), ExtractError> {
        let mut draft = DescriptorDraft::default();
        let mut jsx_backslash = false;

        if let Some(field) = &fields.id {
            let (value, _) = self.evaluate_field(field)?;
            draft.id = Some(
                scalar_text(&value).ok_or_else(|| self.not_static(field.value_span))?,
            );
        }
        if let Some(field) = &fields.description {
            let (value, _) = self.evaluate_field(field)?;
            draft.description = Some(match value {
                Value::String(s) => Value::String(s.trim().to_string()),
                other => other,
            });
        }
        if let Some(field) = &fields.default_message {
            let (value, backslash) = self.evaluate_field(field)?;
            jsx_backslash = backslash;
            draft.default_message = Some(
                scalar_text(&value).ok_or_else(|| self.not_static(field.value_span))?,
            );
        }

        Ok((draft, jsx_backslash))
    }

    fn validate_icu(
        &self,
        message: &str,
        jsx_backslash: bool,
        span: Span,
    ) -> Result<(), ExtractError> {
        if message.is_empty() {
            return Ok(());
        }
        icu::validate(message)
            .map(|_| ())
            .map_err(|err| ExtractError::IcuSyntax {
                detail: err.message,
                offset: err.offset,
                hint: if jsx_backslash { JSX_ESCAPE_HINT } else { "" },
                pos: self.position(span),
            })
    }

    fn insert_draft(
        &mut self,
        draft: DescriptorDraft,
        span: Span,
    ) -> Result<(), ExtractError> {
        let location = self.location(span);
        self.table.insert(draft, location).map_err(|err| {
            let pos = self.position(span);
            match err {
                InsertError::MissingId => ExtractError::MissingId { pos },
                InsertError::MissingDefaultMessage => ExtractError::MissingDefaultMessage { pos },
                InsertError::MissingDescription => ExtractError::MissingDescription { pos },
                InsertError::Duplicate { id } => ExtractError::DuplicateId { id, pos },
            }
        })
    }

    // -------------------------------------------------------------------------
    // Marker-component matcher
    // -------------------------------------------------------------------------

    /// Resolve a JSX element name through the import bindings.
    fn resolve_component(&self, name: &JSXElementName) -> Option<String> {
        match name {
            JSXElementName::Ident(ident) => self
                .bindings
                .resolve(ident.sym.as_ref())
                .map(str::to_string),
            JSXElementName::JSXMemberExpr(member) => {
                let swc_ecma_ast::JSXObject::Ident(object) = &member.obj else {
                    return None;
                };
                if self.bindings.resolve_namespace(object.sym.as_ref()) {
                    Some(member.prop.sym.to_string())
                } else {
                    None
                }
            }
            JSXElementName::JSXNamespacedName(_) => None,
        }
    }

    fn handle_jsx_element(&mut self, elem: &JSXElement) {
        let opening = &elem.opening;
        if self.processed.contains(&opening.span.lo) {
            return;
        }
        let Some(component) = self.resolve_component(&opening.name) else {
            return;
        };
        if component == UNSUPPORTED_MARKER {
            let pos = self.position(opening.span);
            self.warn(&format!(
                "{}: default messages are not extracted from <{}>; use <FormattedMessage> instead",
                pos, UNSUPPORTED_MARKER
            ));
            return;
        }
        if !MARKER_COMPONENTS.contains(&component.as_str()) {
            return;
        }

        let fields = collect_jsx_fields(&opening.attrs);

        // A usage that spreads a descriptor object or computes its id has no
        // defaultMessage attribute; it is defined (and extracted) elsewhere,
        // so leave it untouched.
        if fields.default_message.is_none() && !self.config.optional_default_messages {
            return;
        }

        match self.extract_jsx_descriptor(&fields, opening.span) {
            Ok(()) => {
                if let Some(description) = &fields.description {
                    self.edits.push(rewrite::remove_with_leading_whitespace(
                        self.source,
                        self.file_start,
                        description.node_span,
                    ));
                }
                self.processed.insert(opening.span.lo);
            }
            Err(err) => self.report(err),
        }
    }

    fn extract_jsx_descriptor(
        &mut self,
        fields: &FieldMap,
        span: Span,
    ) -> Result<(), ExtractError> {
        let (draft, jsx_backslash) = self.build_draft(fields)?;
        if let Some(message) = &draft.default_message {
            let message_span = fields
                .default_message
                .map(|field| field.value_span)
                .unwrap_or(span);
            self.validate_icu(message, jsx_backslash, message_span)?;
        }
        self.insert_draft(draft, span)
    }

    // -------------------------------------------------------------------------
    // Batch-definition matcher
    // -------------------------------------------------------------------------

    fn is_define_messages_call(&self, callee: &Callee) -> bool {
        let Callee::Expr(expr) = callee else {
            return false;
        };
        match expr.as_ref() {
            Expr::Ident(ident) => {
                self.bindings.resolve(ident.sym.as_ref()) == Some(DEFINE_MESSAGES)
            }
            Expr::Member(member) => {
                let swc_ecma_ast::MemberProp::Ident(prop) = &member.prop else {
                    return false;
                };
                if prop.sym.as_ref() != DEFINE_MESSAGES {
                    return false;
                }
                let Expr::Ident(object) = member.obj.as_ref() else {
                    return false;
                };
                self.bindings.resolve_namespace(object.sym.as_ref())
            }
            _ => false,
        }
    }

    fn handle_call(&mut self, call: &CallExpr) {
        if self.processed.contains(&call.span.lo) {
            return;
        }
        if !self.is_define_messages_call(&call.callee) {
            return;
        }

        let argument = match call.args.first() {
            Some(arg) if arg.spread.is_none() => arg.expr.as_ref(),
            _ => {
                let pos = self.position(call.span);
                self.report(ExtractError::InvalidShape { pos });
                return;
            }
        };
        let Expr::Object(messages) = argument else {
            let pos = self.position(argument.span());
            self.report(ExtractError::InvalidShape { pos });
            return;
        };

        for prop in &messages.props {
            if self.fatal.is_some() {
                return;
            }
            self.handle_descriptor_candidate(prop);
        }
        self.processed.insert(call.span.lo);
    }

    /// Each property of the defineMessages argument is an independent
    /// descriptor candidate; its key is runtime-only and never inspected.
    fn handle_descriptor_candidate(&mut self, prop: &PropOrSpread) {
        let candidate = match prop {
            PropOrSpread::Prop(prop) => match prop.as_ref() {
                Prop::KeyValue(kv) => match kv.value.as_ref() {
                    Expr::Object(candidate) => candidate,
                    other => {
                        let pos = self.position(other.span());
                        self.report(ExtractError::InvalidShape { pos });
                        return;
                    }
                },
                other => {
                    let pos = self.position(other.span());
                    self.report(ExtractError::InvalidShape { pos });
                    return;
                }
            },
            PropOrSpread::Spread(spread) => {
                let pos = self.position(spread.expr.span());
                self.report(ExtractError::InvalidShape { pos });
                return;
            }
        };

        if self.processed.contains(&candidate.span.lo) {
            return;
        }
        if let Err(err) = self.extract_candidate(candidate) {
            self.report(err);
        }
    }

    fn extract_candidate(&mut self, candidate: &ObjectLit) -> Result<(), ExtractError> {
        let fields = self.collect_object_fields(candidate)?;
        let (draft, _) = self.build_draft(&fields)?;

        let id = match draft.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(ExtractError::MissingId {
                    pos: self.position(candidate.span),
                })
            }
        };
        let default_message = draft.default_message.clone().unwrap_or_default();
        if let Some(field) = &fields.default_message {
            self.validate_icu(&default_message, false, field.value_span)?;
        }

        self.insert_draft(draft, candidate.span)?;

        // Only id and defaultMessage survive to runtime.
        self.edits.push(SourceEdit::replace(
            candidate.span,
            rewrite::minimal_descriptor_source(&id, &default_message),
        ));
        self.processed.insert(candidate.span.lo);
        Ok(())
    }

    fn collect_object_fields<'b>(
        &self,
        object: &'b ObjectLit,
    ) -> Result<FieldMap<'b>, ExtractError> {
        let mut fields = FieldMap::default();
        for prop in &object.props {
            let PropOrSpread::Prop(prop) = prop else {
                continue;
            };
            match prop.as_ref() {
                Prop::KeyValue(kv) => {
                    let key = match &kv.key {
                        PropName::Computed(computed) => {
                            let value = self
                                .env
                                .evaluate(&computed.expr)
                                .ok_or_else(|| self.not_static(computed.span))?;
                            match value {
                                Value::String(s) => s,
                                _ => continue,
                            }
                        }
                        name => match prop_name_text(name) {
                            Some(key) => key,
                            None => continue,
                        },
                    };
                    fields.record(
                        &key,
                        CollectedField {
                            value: FieldValue::Expr(&kv.value),
                            node_span: prop.span(),
                            value_span: kv.value.span(),
                        },
                    );
                }
                Prop::Shorthand(ident) => {
                    fields.record(
                        ident.sym.as_ref(),
                        CollectedField {
                            value: FieldValue::Shorthand(ident.sym.as_ref()),
                            node_span: ident.span,
                            value_span: ident.span,
                        },
                    );
                }
                _ => {}
            }
        }
        Ok(fields)
    }

    // -------------------------------------------------------------------------
    // Scope and const tracking
    // -------------------------------------------------------------------------

    fn shadow_pattern(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(ident) => self.bindings.shadow(ident.id.sym.as_ref()),
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::Assign(assign) => {
                            self.bindings.shadow(assign.key.sym.as_ref())
                        }
                        ObjectPatProp::KeyValue(kv) => self.shadow_pattern(&kv.value),
                        ObjectPatProp::Rest(rest) => self.shadow_pattern(&rest.arg),
                    }
                }
            }
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.shadow_pattern(elem);
                }
            }
            Pat::Assign(assign) => self.shadow_pattern(&assign.left),
            Pat::Rest(rest) => self.shadow_pattern(&rest.arg),
            _ => {}
        }
    }

    fn finish(mut self) -> Result<FileExtraction, ExtractError> {
        if let Some(err) = self.fatal.take() {
            return Err(err);
        }
        let rewritten = rewrite::apply_edits(self.source, self.file_start, &self.edits);
        let changed = !self.edits.is_empty();
        Ok(FileExtraction {
            file: self.file_path,
            messages: self.table.into_messages(),
            rewritten,
            changed,
            warning_count: self.warning_count,
        })
    }
}

impl Visit for MessageVisitor<'_> {
    fn visit_import_decl(&mut self, import: &ImportDecl) {
        self.bindings.collect(import);
    }

    fn visit_jsx_element(&mut self, elem: &JSXElement) {
        if self.fatal.is_some() {
            return;
        }
        self.handle_jsx_element(elem);
        elem.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, call: &CallExpr) {
        if self.fatal.is_some() {
            return;
        }
        self.handle_call(call);
        call.visit_children_with(self);
    }

    fn visit_function(&mut self, function: &Function) {
        self.bindings.enter_scope();
        for param in &function.params {
            self.shadow_pattern(&param.pat);
        }
        function.visit_children_with(self);
        self.bindings.exit_scope();
    }

    fn visit_arrow_expr(&mut self, arrow: &ArrowExpr) {
        self.bindings.enter_scope();
        for param in &arrow.params {
            self.shadow_pattern(param);
        }
        arrow.visit_children_with(self);
        self.bindings.exit_scope();
    }

    fn visit_fn_decl(&mut self, decl: &FnDecl) {
        self.bindings.shadow(decl.ident.sym.as_ref());
        decl.visit_children_with(self);
    }

    fn visit_var_decl(&mut self, var: &VarDecl) {
        for decl in &var.decls {
            self.shadow_pattern(&decl.name);
            if var.kind == VarDeclKind::Const {
                if let (Pat::Ident(ident), Some(init)) = (&decl.name, decl.init.as_deref()) {
                    if let Some(value) = self.env.evaluate(init) {
                        self.env.define(ident.id.sym.to_string(), value);
                    }
                }
            }
        }
        var.visit_children_with(self);
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// =============================================================================
// File entry points
// =============================================================================

fn syntax_for(path: &Path) -> Syntax {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("ts") => Syntax::Typescript(TsSyntax {
            tsx: false,
            decorators: true,
            ..Default::default()
        }),
        Some("tsx") => Syntax::Typescript(TsSyntax {
            tsx: true,
            decorators: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
    }
}

/// Extract messages from source code already in memory. `path` names the
/// file for diagnostics, manifest mirroring, and syntax selection.
pub fn extract_from_source(
    source: &str,
    path: &Path,
    config: &ExtractionConfig,
) -> Result<FileExtraction> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Real(path.to_path_buf()).into(),
        source.to_string(),
    );

    let lexer = Lexer::new(
        syntax_for(path),
        Default::default(),
        StringInput::from(&*fm),
        None,
    );
    let mut parser = Parser::new_from(lexer);

    let display = path.display().to_string();
    let module = match parser.parse_module() {
        Ok(module) => module,
        Err(e) => {
            let loc = cm.lookup_char_pos(e.span().lo);
            logging::warn(&format!(
                "Parse error in {}:{}:{}: {:?}",
                display,
                loc.line,
                loc.col_display + 1,
                e.kind()
            ));
            return Ok(FileExtraction {
                file: display,
                messages: Vec::new(),
                rewritten: source.to_string(),
                changed: false,
                warning_count: 1,
            });
        }
    };

    run_walk(&module, source, fm.start_pos, cm, display, config)
}

fn run_walk(
    module: &Module,
    source: &str,
    file_start: BytePos,
    cm: Lrc<SourceMap>,
    display: String,
    config: &ExtractionConfig,
) -> Result<FileExtraction> {
    let mut visitor = MessageVisitor::new(config, cm, source, file_start, display.clone());
    module.visit_with(&mut visitor);
    visitor
        .finish()
        .with_context(|| format!("extraction failed in {}", display))
}

/// Extract messages from a file on disk.
pub fn extract_from_file<P: AsRef<Path>>(
    path: P,
    config: &ExtractionConfig,
) -> Result<FileExtraction> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    extract_from_source(&source, &relative_to_cwd(path), config)
}

/// Working-directory-relative form of a path, used for display, descriptor
/// locations, and manifest mirroring.
pub fn relative_to_cwd(path: &Path) -> std::path::PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
}

// =============================================================================
// Multi-file pipeline
// =============================================================================

/// Result type for a single file extraction (used internally for lock-free processing)
enum FileResult {
    Success(FileExtraction),
    Error(ExtractionError),
    Empty { warnings: usize },
}

/// Extract messages from every file matching the config's input patterns.
///
/// Files are streamed into worker threads with `par_bridge`; each file's
/// table and processed marks are private to its walk, so the only shared
/// resource is the output filesystem. A fatal error aborts only its own
/// file; the rest of the run continues.
pub fn extract_from_glob(config: &ExtractionConfig) -> Result<ExtractionResult> {
    use rayon::iter::ParallelBridge;
    use rayon::prelude::*;

    let ignore_matchers = Arc::new(compile_ignore_patterns(&config.ignore)?);

    enum GlobItem {
        Path(std::path::PathBuf),
        GlobError { pattern: String, message: String },
        PatternError { pattern: String, message: String },
    }

    let patterns: Vec<&str> = config.input.iter().map(|s| s.as_str()).collect();

    let file_results: Vec<FileResult> = patterns
        .into_iter()
        .flat_map(|pattern| {
            let ignore_for_pattern = Arc::clone(&ignore_matchers);
            match glob::glob(pattern) {
                Ok(paths) => paths
                    .filter_map(move |entry| match entry {
                        Ok(path)
                            if path.is_file()
                                && !matches_ignore_path(&path, ignore_for_pattern.as_ref()) =>
                        {
                            Some(GlobItem::Path(path))
                        }
                        Ok(_) => None,
                        Err(e) => Some(GlobItem::GlobError {
                            pattern: pattern.to_string(),
                            message: e.to_string(),
                        }),
                    })
                    .collect::<Vec<_>>(),
                Err(e) => {
                    vec![GlobItem::PatternError {
                        pattern: pattern.to_string(),
                        message: e.to_string(),
                    }]
                }
            }
        })
        .par_bridge()
        .map(|item| match item {
            GlobItem::Path(path) => match extract_from_file(&path, config) {
                Ok(extraction) => {
                    if extraction.messages.is_empty() {
                        FileResult::Empty {
                            warnings: extraction.warning_count,
                        }
                    } else {
                        FileResult::Success(extraction)
                    }
                }
                Err(e) => FileResult::Error(ExtractionError {
                    file_path: path.display().to_string(),
                    message: e.to_string(),
                }),
            },
            GlobItem::GlobError { pattern, message } => FileResult::Error(ExtractionError {
                file_path: pattern,
                message: format!("Glob error: {}", message),
            }),
            GlobItem::PatternError { pattern, message } => FileResult::Error(ExtractionError {
                file_path: pattern,
                message: format!("Invalid glob pattern: {}", message),
            }),
        })
        .collect();

    let mut result = ExtractionResult::default();
    for file_result in file_results {
        match file_result {
            FileResult::Success(extraction) => {
                result.warning_count += extraction.warning_count;
                result.files.push(extraction);
            }
            FileResult::Error(err) => {
                result.errors.push(err);
            }
            FileResult::Empty { warnings } => {
                result.warning_count += warnings;
            }
        }
    }

    Ok(result)
}

fn matches_ignore_path(path: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(path))
}

fn compile_ignore_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    let mut compiled = Vec::new();
    for pattern in patterns {
        let matcher = Pattern::new(pattern)
            .with_context(|| format!("Invalid ignore glob pattern: {}", pattern))?;
        compiled.push(matcher);
    }
    Ok(compiled)
}

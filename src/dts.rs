//! Declaration emission engine.
//!
//! Lays a batch of extracted services out as a TypeScript declaration
//! tree: one directory per provider group, one module per service,
//! oversized services split by endpoint-name prefix, re-export indices
//! at every level. Runs strictly after extraction: the group index can
//! only be finalized once every service module is known.
//!
//! Paths:
//!   <root>/<group>/<slug>.d.ts                       service module
//!   <root>/<group>/<slug>/<slug>_<partition>.d.ts    split partitions
//!   <root>/<group>/index.d.ts, <root>/index.d.ts     re-export indices
pub mod project;

use std::sync::Arc;

use colored::Colorize;
use indexmap::IndexMap;

use crate::model::{Endpoint, Group, LiteralType, ScalarType, Service, Type};
use crate::strings;
use project::{EnumDecl, Interface, InterfaceProp, Project, SourceUnit};

/// Services with more endpoints than this get split, when they can be.
const SPLIT_THRESHOLD: usize = 20;

/// Lay out the whole batch. Deterministic: input order drives unit
/// order, insertion order drives declaration order.
pub fn emit(services: &[Service]) -> anyhow::Result<Project> {
    let mut project = Project::new();

    let mut slugs_by_group: IndexMap<Group, Vec<String>> = IndexMap::new();
    for service in services {
        let slug = transform_service(&mut project, service)?;
        slugs_by_group.entry(service.group).or_default().push(slug);
    }

    for (group, slugs) in &slugs_by_group {
        let index = project.create_unit(format!("{}/index.d.ts", group.as_str()))?;
        for slug in slugs {
            index.add_export(format!("./{slug}"));
        }
    }

    let root = project.create_unit("index.d.ts")?;
    for group in slugs_by_group.keys() {
        root.add_export(format!("./{}", group.as_str()));
    }

    Ok(project)
}

fn transform_service(project: &mut Project, service: &Service) -> anyhow::Result<String> {
    let slug = strings::snake_case(&service.title);
    let group = service.group.as_str();
    let path = format!("{group}/{slug}.d.ts");

    let partitions = partition_plan(service);

    let unit = project.create_unit(path)?;
    // marker interface documents which luna uri the module came from
    unit.add_interface(Interface {
        name: strings::pascal_case(&service.title),
        exported: false,
        docs: vec![service.uri.clone()],
        properties: vec![],
    });

    match partitions {
        Some(parts) => {
            // service module becomes the re-export hub for its partitions
            for key in parts.keys() {
                unit.add_export(format!("./{slug}/{slug}_{key}"));
            }
            for (key, endpoints) in &parts {
                let sub = project.create_unit(format!("{group}/{slug}/{slug}_{key}.d.ts"))?;
                for endpoint in endpoints {
                    transform_endpoint(sub, service, endpoint);
                }
            }
        }
        None => {
            if service.endpoints.len() > SPLIT_THRESHOLD {
                eprintln!(
                    "{} service {} has {} endpoints and no splittable names, emitting one module",
                    "warn:".yellow().bold(),
                    service.title,
                    service.endpoints.len()
                );
            }
            for endpoint in &service.endpoints {
                transform_endpoint(unit, service, endpoint);
            }
        }
    }

    Ok(slug)
}

/// Partition the endpoints by the text before the first `/` when the
/// service is oversized and at least one name carries a separator.
/// Keys come back snake-cased, grouped in first-seen order.
fn partition_plan(service: &Service) -> Option<IndexMap<String, Vec<&Endpoint>>> {
    if service.endpoints.len() <= SPLIT_THRESHOLD {
        return None;
    }
    if !service.endpoints.iter().any(|e| e.name.contains('/')) {
        return None;
    }
    let mut parts: IndexMap<String, Vec<&Endpoint>> = IndexMap::new();
    for endpoint in &service.endpoints {
        let prefix = endpoint.name.split('/').next().unwrap_or(&endpoint.name);
        parts
            .entry(strings::snake_case(prefix))
            .or_default()
            .push(endpoint);
    }
    Some(parts)
}

fn transform_endpoint(unit: &mut SourceUnit, service: &Service, endpoint: &Endpoint) {
    if let Type::Literal(parameters) = &endpoint.parameters {
        interface_from_literal(unit, service, parameters);
    }

    if let Some(errors) = endpoint.errors.as_deref().filter(|e| !e.is_empty()) {
        unit.add_enum(EnumDecl {
            name: format!(
                "{}{}Error",
                strings::pascal_case(&service.title),
                strings::pascal_case(&endpoint.name)
            ),
            members: errors
                .iter()
                .map(|e| (strings::enum_member(&e.message), e.code.clone()))
                .collect(),
        });
    }

    if let Some(ret) = &endpoint.call_return {
        interface_from_literal(unit, service, ret);
    }
    if let Some(sub) = &endpoint.subscription_return {
        interface_from_literal(unit, service, sub);
    }
}

/// Add the interface for an object literal (and, transitively, for every
/// literal its properties reference) to the unit. Insertion is
/// idempotent per unit, keyed by the derived interface name.
fn interface_from_literal(
    unit: &mut SourceUnit,
    service: &Service,
    literal: &Arc<LiteralType>,
) -> String {
    let interface_name = format!(
        "{}{}",
        strings::pascal_case(&service.title),
        strings::pascal_case(&literal.name)
    );
    if unit.has_interface(&interface_name) {
        return interface_name;
    }

    let properties = literal
        .properties
        .iter()
        .map(|p| {
            let base = type_name(unit, service, &interface_name, &p.ty);
            InterfaceProp {
                name: p.name.clone(),
                ty: if p.array { format!("{base}[]") } else { base },
                optional: !p.required,
                docs: p.docs.clone(),
            }
        })
        .collect();

    unit.add_interface(Interface {
        name: interface_name.clone(),
        exported: true,
        docs: vec![],
        properties,
    });
    interface_name
}

/// Spell a property's type: scalars verbatim, `parent` as the enclosing
/// interface, nested literals by their (recursively inserted) name.
fn type_name(
    unit: &mut SourceUnit,
    service: &Service,
    enclosing: &str,
    ty: &Type,
) -> String {
    match ty {
        Type::Scalar(ScalarType::Parent) => enclosing.to_string(),
        Type::Scalar(scalar) => scalar.dts_name().to_string(),
        Type::Literal(literal) => interface_from_literal(unit, service, literal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EndpointError, Property};

    fn literal(name: &str, properties: Vec<Property>) -> Arc<LiteralType> {
        Arc::new(LiteralType { name: name.into(), properties })
    }

    fn prop(name: &str, ty: Type, array: bool, required: bool) -> Property {
        Property { name: name.into(), docs: vec![], ty, array, required }
    }

    fn endpoint(name: &str) -> Endpoint {
        Endpoint {
            name: name.into(),
            parameters: Type::Scalar(ScalarType::Never),
            call_return: None,
            subscription_return: None,
            errors: None,
        }
    }

    fn service(title: &str, group: Group, endpoints: Vec<Endpoint>) -> Service {
        Service {
            uri: format!("luna://com.webos.{}", strings::snake_case(title)),
            title: title.into(),
            group,
            endpoints,
        }
    }

    fn rendered(project: &Project, path: &str) -> String {
        project
            .units()
            .find(|(p, _)| *p == path)
            .map(|(_, u)| u.render())
            .unwrap_or_else(|| panic!("missing unit {path}"))
    }

    #[test]
    fn small_service_becomes_one_module_plus_indices() {
        let mut e = endpoint("getStatus");
        e.parameters = Type::Literal(literal(
            "GetStatusParameters",
            vec![prop("subscribe", Type::Scalar(ScalarType::Boolean), false, false)],
        ));
        let project = emit(&[service("Audio", Group::Ose, vec![e])]).unwrap();

        let paths: Vec<_> = project.units().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["ose/audio.d.ts", "ose/index.d.ts", "index.d.ts"]);

        let body = rendered(&project, "ose/audio.d.ts");
        assert!(body.contains("/** luna://com.webos.audio */\ninterface Audio {}"));
        assert!(body.contains("export interface AudioGetStatusParameters {"));
        assert!(body.contains("    subscribe?: boolean;"));

        assert_eq!(rendered(&project, "ose/index.d.ts"), "export * from './audio';\n");
        assert_eq!(rendered(&project, "index.d.ts"), "export * from './ose';\n");
    }

    #[test]
    fn oversized_splittable_service_partitions_by_prefix() {
        let mut endpoints: Vec<Endpoint> = (0..11).map(|i| endpoint(&format!("adapter/op{i}"))).collect();
        endpoints.extend((0..10).map(|i| endpoint(&format!("device/op{i}"))));
        assert!(endpoints.len() > SPLIT_THRESHOLD);

        let project = emit(&[service("Bluetooth2", Group::Ose, endpoints)]).unwrap();
        let paths: Vec<_> = project.units().map(|(p, _)| p.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "ose/bluetooth_2.d.ts",
                "ose/bluetooth_2/bluetooth_2_adapter.d.ts",
                "ose/bluetooth_2/bluetooth_2_device.d.ts",
                "ose/index.d.ts",
                "index.d.ts",
            ]
        );

        let hub = rendered(&project, "ose/bluetooth_2.d.ts");
        assert!(hub.contains("export * from './bluetooth_2/bluetooth_2_adapter';"));
        assert!(hub.contains("export * from './bluetooth_2/bluetooth_2_device';"));
        assert_eq!(rendered(&project, "ose/index.d.ts"), "export * from './bluetooth_2';\n");
    }

    #[test]
    fn oversized_unsplittable_service_stays_one_module() {
        let endpoints: Vec<Endpoint> = (0..25).map(|i| endpoint(&format!("op{i}"))).collect();
        let project = emit(&[service("Settings", Group::Lg, endpoints)]).unwrap();
        let paths: Vec<_> = project.units().map(|(p, _)| p.to_string()).collect();
        assert_eq!(paths, vec!["lg/settings.d.ts", "lg/index.d.ts", "index.d.ts"]);
    }

    #[test]
    fn endpoint_declarations_cover_params_errors_and_returns() {
        let mut e = endpoint("foo/bar");
        e.parameters = Type::Literal(literal(
            "FooBarParameters",
            vec![
                prop("x", Type::Scalar(ScalarType::String), false, true),
                prop("y", Type::Scalar(ScalarType::Number), false, false),
            ],
        ));
        e.call_return = Some(literal(
            "FooBarCallReturn",
            vec![prop("tags", Type::Scalar(ScalarType::String), true, true)],
        ));
        e.errors = Some(vec![EndpointError { code: "123".into(), message: "Bad Input".into() }]);

        let project = emit(&[service("Audio", Group::Ose, vec![e])]).unwrap();
        let body = rendered(&project, "ose/audio.d.ts");

        assert!(body.contains("export interface AudioFooBarParameters {"));
        assert!(body.contains("    x: string;"));
        assert!(body.contains("    y?: number;"));
        assert!(body.contains("    tags: string[];"));
        assert!(body.contains("export enum AudioFooBarError {"));
        assert!(body.contains("    BAD_INPUT = \"123\","));
    }

    #[test]
    fn parent_scalar_spells_the_enclosing_interface() {
        let status = literal(
            "VolumeStatus",
            vec![
                prop("volume", Type::Scalar(ScalarType::Number), false, true),
                prop("child", Type::Scalar(ScalarType::Parent), false, false),
            ],
        );
        let mut e = endpoint("getVolume");
        e.call_return = Some(literal(
            "GetVolumeCallReturn",
            vec![prop("volumeStatus", Type::Literal(status), false, true)],
        ));

        let project = emit(&[service("Audio", Group::Ose, vec![e])]).unwrap();
        let body = rendered(&project, "ose/audio.d.ts");
        assert!(body.contains("    child?: AudioVolumeStatus;"));
        assert!(body.contains("    volumeStatus: AudioVolumeStatus;"));
    }

    #[test]
    fn shared_literals_are_inserted_once_per_unit() {
        let shared = literal(
            "CommonStatus",
            vec![prop("ok", Type::Scalar(ScalarType::Boolean), false, true)],
        );
        let mut a = endpoint("start");
        a.call_return = Some(Arc::clone(&shared));
        let mut b = endpoint("stop");
        b.call_return = Some(shared);

        let project = emit(&[service("Power", Group::Ose, vec![a, b])]).unwrap();
        let body = rendered(&project, "ose/power.d.ts");
        assert_eq!(body.matches("export interface PowerCommonStatus {").count(), 1);
    }

    #[test]
    fn duplicate_service_modules_collide() {
        let a = service("Audio", Group::Ose, vec![endpoint("x")]);
        let b = service("Audio", Group::Ose, vec![endpoint("y")]);
        assert!(emit(&[a, b]).is_err());
    }
}

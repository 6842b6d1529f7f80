use quick_xml::{
    events::{attributes::Attributes, BytesStart, Event},
    Reader,
};
use std::io::BufRead;

use super::{
    error::Error,
    types::{Binding, BindingOperation, Definition, Port, Service},
};

fn get_attributes<B: BufRead, const N: usize>(
    reader: &Reader<B>,
    attributes: Attributes<'_>,
    names: [&'static str; N],
) -> Result<[Option<String>; N], Error> {
    const INIT: Option<String> = None;
    let mut result = [INIT; N];

    for attribute in attributes {
        let attribute = attribute?;
        let key = reader.decode(attribute.key)?;

        for (index, name) in names.iter().enumerate() {
            if key == *name {
                result[index] = Some(reader.decode(attribute.value.as_ref())?.to_owned());
                break;
            }
        }
    }

    Ok(result)
}

fn split_namespaced_name(prefixed_name: &str) -> (Option<&str>, &str) {
    let mut split = prefixed_name.split(':');
    let first = split.next().unwrap();
    let second = split.next();

    if let Some(second) = second {
        (Some(first), second)
    } else {
        (None, first)
    }
}

/// What a start tag opened, so the matching end tag closes the right
/// builder. Elements the model does not keep (types, messages, portType
/// operations, soap extension tags) are `Other`.
enum Scope {
    Service,
    Port,
    Binding,
    Operation,
    Other,
}

struct PortBuilder {
    name: String,
    binding: String,
    location: Option<String>,
}

#[derive(Default)]
struct Parser {
    definition: Definition,
    service: Option<Service>,
    port: Option<PortBuilder>,
    binding: Option<Binding>,
    operation: Option<BindingOperation>,
}

impl Parser {
    fn handle_start<B: BufRead>(
        &mut self,
        reader: &Reader<B>,
        start: &BytesStart<'_>,
    ) -> Result<Scope, Error> {
        let name = reader.decode(start.name())?;
        let (_, local_name) = split_namespaced_name(name);

        match local_name {
            "service" if self.service.is_none() => {
                let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                let name = name.ok_or(Error::MissingAttribute {
                    element: "service",
                    attribute: "name",
                })?;

                self.service = Some(Service {
                    name,
                    ports: Vec::new(),
                });

                Ok(Scope::Service)
            }

            "port" if self.service.is_some() && self.port.is_none() => {
                let [name, binding] =
                    get_attributes(reader, start.attributes(), ["name", "binding"])?;

                let name = name.ok_or(Error::MissingAttribute {
                    element: "port",
                    attribute: "name",
                })?;

                let binding = binding.ok_or(Error::MissingAttribute {
                    element: "port",
                    attribute: "binding",
                })?;

                let (_, binding) = split_namespaced_name(&binding);

                self.port = Some(PortBuilder {
                    name,
                    binding: binding.to_owned(),
                    location: None,
                });

                Ok(Scope::Port)
            }

            "address" => {
                if let Some(port) = &mut self.port {
                    let [location] = get_attributes(reader, start.attributes(), ["location"])?;
                    port.location = location;
                }

                Ok(Scope::Other)
            }

            "binding" => {
                if let Some(binding) = &mut self.binding {
                    // The nested soap binding extension carries the transport.
                    let [transport] = get_attributes(reader, start.attributes(), ["transport"])?;

                    if transport.is_some() {
                        binding.transport = transport;
                    }

                    Ok(Scope::Other)
                } else {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = name.ok_or(Error::MissingAttribute {
                        element: "binding",
                        attribute: "name",
                    })?;

                    self.binding = Some(Binding {
                        name,
                        transport: None,
                        operations: Vec::new(),
                    });

                    Ok(Scope::Binding)
                }
            }

            "operation" => {
                // Operations under portType duplicate the binding's and are
                // skipped.
                if self.binding.is_none() {
                    return Ok(Scope::Other);
                }

                if let Some(operation) = &mut self.operation {
                    // The nested soap operation extension carries the action.
                    let [action] = get_attributes(reader, start.attributes(), ["soapAction"])?;

                    if action.is_some() {
                        operation.action = action;
                    }

                    Ok(Scope::Other)
                } else {
                    let [name] = get_attributes(reader, start.attributes(), ["name"])?;
                    let name = name.ok_or(Error::MissingAttribute {
                        element: "operation",
                        attribute: "name",
                    })?;

                    self.operation = Some(BindingOperation { name, action: None });

                    Ok(Scope::Operation)
                }
            }

            _ => Ok(Scope::Other),
        }
    }

    fn handle_end(&mut self, scope: Scope) {
        match scope {
            Scope::Service => {
                if let Some(service) = self.service.take() {
                    self.definition.services.push(service);
                }
            }

            Scope::Port => {
                if let Some(port) = self.port.take() {
                    // Ports without a soap address (plain http bindings)
                    // cannot be dispatched to and are dropped.
                    if let (Some(service), Some(location)) = (&mut self.service, port.location) {
                        service.ports.push(Port {
                            name: port.name,
                            binding: port.binding,
                            location,
                        });
                    }
                }
            }

            Scope::Binding => {
                if let Some(binding) = self.binding.take() {
                    self.definition.bindings.push(binding);
                }
            }

            Scope::Operation => {
                if let (Some(binding), Some(operation)) = (&mut self.binding, self.operation.take())
                {
                    binding.operations.push(operation);
                }
            }

            Scope::Other => (),
        }
    }
}

pub fn parse(document: &[u8]) -> Result<Definition, Error> {
    let mut reader = Reader::from_reader(document);
    reader.trim_text(true);

    let mut parser = Parser::default();
    let mut stack = Vec::new();
    let mut buffer = Vec::new();

    loop {
        match reader.read_event(&mut buffer)? {
            Event::Start(start) => {
                let scope = parser.handle_start(&reader, &start)?;
                stack.push(scope);
            }

            Event::Empty(start) => {
                let scope = parser.handle_start(&reader, &start)?;
                parser.handle_end(scope);
            }

            Event::End(..) => {
                if let Some(scope) = stack.pop() {
                    parser.handle_end(scope);
                }
            }

            Event::Eof => break,

            _ => (),
        }

        buffer.clear();
    }

    Ok(parser.definition)
}

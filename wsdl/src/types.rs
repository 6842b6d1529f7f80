/// Parsed WSDL metadata. Vectors preserve definition order, which makes
/// "first match wins" lookups an explicit policy rather than an accident
/// of map iteration.
#[derive(Default, Debug, Clone)]
pub struct Definition {
    pub services: Vec<Service>,
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone)]
pub struct Service {
    pub name: String,
    pub ports: Vec<Port>,
}

/// A port pairs a binding (referenced by local name) with the concrete
/// network address the service advertises.
#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub binding: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub transport: Option<String>,
    pub operations: Vec<BindingOperation>,
}

#[derive(Debug, Clone)]
pub struct BindingOperation {
    pub name: String,
    pub action: Option<String>,
}

impl Definition {
    /// Look up a binding by its local name, in definition order.
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|binding| binding.name == name)
    }
}

impl Binding {
    /// Look up an operation of this binding by name, in definition order.
    pub fn operation(&self, name: &str) -> Option<&BindingOperation> {
        self.operations
            .iter()
            .find(|operation| operation.name == name)
    }
}

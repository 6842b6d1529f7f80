use async_trait::async_trait;
use fisco::{
    communicate, Config, Error, HttpClient, HttpRequest, HttpResponse, Method, Response,
    TransportError,
};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const WSDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<wsdl:definitions xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap12="http://schemas.xmlsoap.org/wsdl/soap12/"
    xmlns:tns="http://www.portalfiscal.inf.br/nfe/wsdl/NFeAutorizacao4"
    targetNamespace="http://www.portalfiscal.inf.br/nfe/wsdl/NFeAutorizacao4">
  <wsdl:binding name="NFeAutorizacao4Soap12" type="tns:NFeAutorizacao4Soap">
    <soap12:binding transport="http://schemas.xmlsoap.org/soap/http"/>
    <wsdl:operation name="nfeAutorizacaoLote">
      <soap12:operation soapAction="http://www.portalfiscal.inf.br/nfe/wsdl/NFeAutorizacao4/nfeAutorizacaoLote"/>
      <wsdl:input><soap12:body use="literal"/></wsdl:input>
      <wsdl:output><soap12:body use="literal"/></wsdl:output>
    </wsdl:operation>
  </wsdl:binding>
  <wsdl:service name="NFeAutorizacao4">
    <wsdl:port name="NFeAutorizacao4Soap12" binding="tns:NFeAutorizacao4Soap12">
      <soap12:address location="http://homologacao.nfe.fazenda.gov.br:80/ws/NFeAutorizacao4.asmx"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

const SOAP_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <nfeResultMsg>
      <retEnviNFe>
        <cStat>103</cStat>
        <xMotivo>Lote recebido com sucesso</xMotivo>
      </retEnviNFe>
    </nfeResultMsg>
  </soap:Body>
</soap:Envelope>"#;

const FAULT_RESPONSE: &str = r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Body>
    <soap:Fault>
      <faultcode>soap:Sender</faultcode>
      <faultstring>certificado expirado</faultstring>
    </soap:Fault>
  </soap:Body>
</soap:Envelope>"#;

#[derive(Clone)]
struct RecordedRequest {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl RecordedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn ok(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: body.to_owned(),
        }
    }

    fn status(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_owned(),
        }
    }

    fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        match self.responses.lock().unwrap().pop_front() {
            Some(response) => Ok(response),
            None => Err(TransportError::Status {
                status: 599,
                body: "no scripted response".to_owned(),
            }),
        }
    }
}

fn config_with(mock: &Arc<MockTransport>) -> Config {
    Config {
        http_client: Some(Arc::clone(mock) as Arc<dyn HttpClient>),
        ..Config::default()
    }
}

fn message() -> serde_json::Value {
    json!({ "nfeDadosMsg": { "$xml": "<enviNFe versao=\"4.00\"/>" } })
}

#[tokio::test]
async fn resolves_with_the_decoded_record() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL), MockTransport::ok(SOAP_RESPONSE)]);
    let config = config_with(&mock);

    let response = communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(
        response,
        Response::Parsed(json!({
            "nfeResultMsg": {
                "retEnviNFe": {
                    "cStat": "103",
                    "xMotivo": "Lote recebido com sucesso"
                }
            }
        }))
    );

    let requests = mock.recorded();
    assert_eq!(requests.len(), 2);

    // The WSDL fetch appends the marker and goes through the transport.
    assert_eq!(requests[0].method, Method::Get);
    assert_eq!(
        requests[0].url,
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx?wsdl"
    );

    // The dispatch targets the normalized port location (the advertised
    // :80 is stripped; no certificate, so no scheme upgrade).
    assert_eq!(requests[1].method, Method::Post);
    assert_eq!(
        requests[1].url,
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx"
    );
    assert_eq!(
        requests[1].header("Content-Type"),
        Some("application/soap+xml")
    );

    let body = requests[1].body.as_deref().unwrap();
    assert!(body.contains("<enviNFe versao=\"4.00\"/>"));
    assert!(body.contains("http://www.w3.org/2003/05/soap-envelope"));
}

#[tokio::test]
async fn raw_response_resolves_with_the_untouched_body() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL), MockTransport::ok(SOAP_RESPONSE)]);
    let config = Config {
        raw_response: true,
        ..config_with(&mock)
    };

    let response = communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(response, Response::Raw(SOAP_RESPONSE.to_owned()));
}

#[tokio::test]
async fn an_authenticated_call_upgrades_the_dispatch_location() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL), MockTransport::ok(SOAP_RESPONSE)]);
    let config = Config {
        certificate: Some(vec![0x30, 0x82]),
        password: Some("passphrase".to_owned()),
        ..config_with(&mock)
    };

    communicate(
        "https://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    let requests = mock.recorded();
    assert_eq!(
        requests[1].url,
        "https://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx"
    );
}

#[tokio::test]
async fn an_unknown_method_is_rejected_before_any_dispatch() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL)]);
    let config = config_with(&mock);

    let error = communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeInutilizacao",
        message(),
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(error, Error::MethodNotFound(ref name) if name == "nfeInutilizacao"));

    // Only the WSDL fetch went out.
    assert_eq!(mock.recorded().len(), 1);
}

#[tokio::test]
async fn validation_failures_reject_before_any_request() {
    let mock = MockTransport::new(vec![]);
    let config = config_with(&mock);

    let error = communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        json!("not a record"),
        &config,
    )
    .await
    .unwrap_err();

    assert_eq!(
        error.to_string(),
        "Expected an object for message, got a string"
    );
    assert_eq!(mock.recorded().len(), 0);
}

#[tokio::test]
async fn a_fault_resolves_as_response_data() {
    let mock = MockTransport::new(vec![
        MockTransport::ok(WSDL),
        MockTransport::status(500, FAULT_RESPONSE),
    ]);
    let config = config_with(&mock);

    let response = communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(
        response,
        Response::Parsed(json!({
            "Fault": {
                "faultcode": "soap:Sender",
                "faultstring": "certificado expirado"
            }
        }))
    );
}

#[tokio::test]
async fn an_error_status_without_an_envelope_is_a_transport_error() {
    let mock = MockTransport::new(vec![
        MockTransport::ok(WSDL),
        MockTransport::status(502, "<html><body>Bad Gateway</body></html>"),
    ]);
    let config = config_with(&mock);

    let error = communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        error,
        Error::Transport(TransportError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn a_failing_wsdl_fetch_propagates_unchanged() {
    let mock = MockTransport::new(vec![MockTransport::status(404, "not here")]);
    let config = config_with(&mock);

    let error = communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap_err();

    assert!(matches!(
        error,
        Error::Transport(TransportError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn soap11_dispatch_carries_the_quoted_soapaction_header() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL), MockTransport::ok(SOAP_RESPONSE)]);
    let config = Config {
        force_soap12_headers: Some(false),
        content_type: Some("text/xml; charset=utf-8".to_owned()),
        ..config_with(&mock)
    };

    communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    let requests = mock.recorded();
    let dispatch = &requests[1];

    assert_eq!(
        dispatch.header("SOAPAction"),
        Some("\"http://www.portalfiscal.inf.br/nfe/wsdl/NFeAutorizacao4/nfeAutorizacaoLote\"")
    );
    assert_eq!(dispatch.header("Content-Type"), Some("text/xml; charset=utf-8"));

    let body = dispatch.body.as_deref().unwrap();
    assert!(body.contains("http://schemas.xmlsoap.org/soap/envelope/"));
}

#[tokio::test]
async fn soap12_dispatch_does_not_carry_a_soapaction_header() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL), MockTransport::ok(SOAP_RESPONSE)]);
    let config = config_with(&mock);

    communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(mock.recorded()[1].header("SOAPAction"), None);
}

#[tokio::test]
async fn header_fragments_are_written_into_the_request() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL), MockTransport::ok(SOAP_RESPONSE)]);
    let config = Config {
        headers: vec!["<cUF>35</cUF>".to_owned(), "<versao>4.00</versao>".to_owned()],
        ..config_with(&mock)
    };

    communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    let requests = mock.recorded();
    let body = requests[1].body.as_deref().unwrap();

    let first = body.find("<cUF>35</cUF>").unwrap();
    let second = body.find("<versao>4.00</versao>").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn a_url_that_already_names_the_wsdl_is_fetched_unchanged() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL), MockTransport::ok(SOAP_RESPONSE)]);
    let config = config_with(&mock);

    communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx?WSDL",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(
        mock.recorded()[0].url,
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx?WSDL"
    );
}

#[tokio::test]
async fn the_location_hook_overrides_the_dispatch_target() {
    let mock = MockTransport::new(vec![MockTransport::ok(WSDL), MockTransport::ok(SOAP_RESPONSE)]);
    let config = Config {
        format_location: Some(Box::new(|location, _| {
            format!("{}?endpoint=alternate", location)
        })),
        ..config_with(&mock)
    };

    communicate(
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx",
        "nfeAutorizacaoLote",
        message(),
        &config,
    )
    .await
    .unwrap();

    assert_eq!(
        mock.recorded()[1].url,
        "http://homologacao.nfe.fazenda.gov.br/ws/NFeAutorizacao4.asmx?endpoint=alternate"
    );
}
